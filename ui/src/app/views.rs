use iced::alignment::Horizontal;
use iced::theme;
use iced::widget::{
    button, checkbox, column, container, pick_list, row, scrollable, text, text_input, Space,
};
use iced::{Alignment, Color, Element, Length};

use casedesk_core::{PageSize, Record, RecordDetail, RecordId, StatusTag};

use crate::app::helpers::{can_annotate, level_color, notification_color, or_dash};
use crate::app::modal::Modal;
use crate::app::styles::{DialogStyle, RowStyle, TabStyle, ToastStyle};
use crate::app::types::{FilterChoice, Message, Tab};
use crate::app::DashboardApp;
use crate::logging::LogLevel;

const HEADING: Color = rgb(0x10, 0x1a, 0x24);
const MUTED: Color = rgb(0x5f, 0x6b, 0x7a);
const LABEL: Color = rgb(0x3a, 0x4a, 0x5a);
const VALUE: Color = rgb(0x1f, 0x2a, 0x37);
const DANGER: Color = rgb(0xe0, 0x4f, 0x4f);
const DIALOG_WIDTH: f32 = 480.0;

impl DashboardApp {
    pub(super) fn root_view(&self) -> Element<'_, Message> {
        let header = row![
            text("CaseDesk")
                .size(28)
                .style(theme::Text::Color(HEADING)),
            text(&self.config.base_url)
                .size(14)
                .style(theme::Text::Color(MUTED)),
        ]
        .spacing(12)
        .align_items(Alignment::Center);

        let body = match self.active_tab {
            Tab::Records => self.records_view(),
            Tab::Debug => self.debug_tab_view(),
        };

        let content = column![header, self.tab_bar(), self.toasts_view(), body]
            .spacing(16)
            .padding(16);

        let page = container(content)
            .width(Length::Fill)
            .height(Length::Fill);

        match self.dialog_view() {
            Some((dialog, on_blur)) => Modal::new(page, dialog).on_blur(on_blur).into(),
            None => page.into(),
        }
    }

    fn tab_bar(&self) -> Element<'_, Message> {
        row![
            self.tab_button(Tab::Records, "Records"),
            self.tab_button(Tab::Debug, "Debug")
        ]
        .spacing(4)
        .align_items(Alignment::Center)
        .into()
    }

    fn tab_button(&self, tab: Tab, label: &str) -> Element<'_, Message> {
        button(text(label).size(14))
            .padding([6, 14])
            .style(theme::Button::custom(TabStyle {
                active: self.active_tab == tab,
            }))
            .on_press(Message::SelectTab(tab))
            .into()
    }

    fn toasts_view(&self) -> Element<'_, Message> {
        let mut stack = column![].spacing(8).align_items(Alignment::End);

        for toast in &self.toasts {
            let mut lines = column![text(&toast.summary).size(14)].spacing(2);
            if let Some(detail) = &toast.detail {
                lines = lines.push(
                    text(detail)
                        .size(12)
                        .style(theme::Text::Color(MUTED)),
                );
            }

            let dismiss = button(text("×").size(14))
                .padding([0, 6])
                .style(theme::Button::Text)
                .on_press(Message::DismissToast(toast.id));

            stack = stack.push(
                container(
                    row![lines.width(Length::Fill), dismiss]
                        .spacing(8)
                        .align_items(Alignment::Start),
                )
                .padding(10)
                .width(Length::Fixed(340.0))
                .style(theme::Container::Custom(Box::new(ToastStyle {
                    accent: notification_color(toast.kind),
                }))),
            );
        }

        container(stack)
            .width(Length::Fill)
            .align_x(Horizontal::Right)
            .into()
    }

    fn records_view(&self) -> Element<'_, Message> {
        column![
            self.list_header_view(),
            self.table_view(),
            self.pagination_view()
        ]
        .spacing(12)
        .height(Length::Fill)
        .into()
    }

    /// Filter controls, or the bulk bar while anything is selected.
    fn list_header_view(&self) -> Element<'_, Message> {
        let controller = &self.controller;

        let mode: Element<'_, Message> = if controller.is_bulk_mode() {
            row![
                text(format!("{} selected", controller.selected_count()))
                    .size(16)
                    .style(theme::Text::Color(HEADING)),
                button("Delete selected")
                    .style(theme::Button::Destructive)
                    .on_press(Message::RequestDeleteSelected),
                button("Clear selection")
                    .style(theme::Button::Secondary)
                    .on_press(Message::SelectAll(false)),
            ]
            .spacing(12)
            .align_items(Alignment::Center)
            .into()
        } else {
            row![
                text("Status")
                    .size(14)
                    .style(theme::Text::Color(LABEL)),
                pick_list(
                    &FilterChoice::ALL[..],
                    Some(FilterChoice::from_filter(controller.filter())),
                    Message::FilterChanged,
                ),
            ]
            .spacing(12)
            .align_items(Alignment::Center)
            .into()
        };

        let loading = if controller.is_loading() {
            "Loading…"
        } else {
            ""
        };

        row![
            mode,
            Space::with_width(Length::Fill),
            text(loading).size(13).style(theme::Text::Color(MUTED)),
            button("Refresh")
                .style(theme::Button::Primary)
                .on_press(Message::Refresh),
        ]
        .spacing(12)
        .align_items(Alignment::Center)
        .into()
    }

    fn table_view(&self) -> Element<'_, Message> {
        let visible = self.controller.visible();

        let mut rows = column![self.table_header()].spacing(6);
        if visible.is_empty() {
            rows = rows.push(self.empty_state());
        }
        for record in visible {
            rows = rows.push(self.table_row(record));
        }

        scrollable(rows)
            .height(Length::Fill)
            .width(Length::Fill)
            .into()
    }

    fn table_header(&self) -> Element<'_, Message> {
        let controller = &self.controller;
        let all_selected = !controller.records().is_empty() && controller.is_all_selected();
        let select_all = checkbox("", all_selected).on_toggle(Message::SelectAll);
        // Partial selection has no native checkbox state.
        let partial = if controller.is_some_selected() { "—" } else { "" };

        row![
            row![select_all, text(partial).size(12)]
                .spacing(2)
                .width(Length::Fixed(48.0))
                .align_items(Alignment::Center),
            header_cell("Category", 2),
            header_cell("Date", 2),
            header_cell("Location", 2),
            header_cell("Station", 2),
            header_cell("Status", 2),
            header_cell("Actions", 5),
        ]
        .spacing(12)
        .padding([4, 8])
        .align_items(Alignment::Center)
        .into()
    }

    fn table_row(&self, record: &Record) -> Element<'_, Message> {
        let id = record.id.clone();
        let selected = self.controller.is_selected(&record.id);
        let select = checkbox("", selected).on_toggle({
            let id = id.clone();
            move |_| Message::SelectOne(id.clone())
        });

        let next_status = StatusTag::toggled(record.status_tag);
        let mut actions = row![button(text(format!("→ {}", next_status.label())).size(12))
            .padding([4, 8])
            .style(theme::Button::Secondary)
            .on_press(Message::ToggleStatus(id.clone()))]
        .spacing(6)
        .width(Length::FillPortion(5));
        if can_annotate(record) {
            actions = actions.push(
                button(text("Annotate").size(12))
                    .padding([4, 8])
                    .style(theme::Button::Secondary)
                    .on_press(Message::OpenAnnotate(id.clone())),
            );
        }
        let actions = actions
            .push(
                button(text("Details").size(12))
                    .padding([4, 8])
                    .style(theme::Button::Secondary)
                    .on_press(Message::OpenDetail(id.clone())),
            )
            .push(
                button(text("Delete").size(12))
                    .padding([4, 8])
                    .style(theme::Button::Destructive)
                    .on_press(Message::RequestDelete(id)),
            );

        let line = row![
            container(select).width(Length::Fixed(48.0)),
            value_cell(record.category.as_deref(), 2),
            value_cell(record.reported_date.as_deref(), 2),
            value_cell(record.location_name.as_deref(), 2),
            value_cell(record.location_detail.as_deref(), 2),
            container(self.status_badge(record.display_status())).width(Length::FillPortion(2)),
            actions,
        ]
        .spacing(12)
        .align_items(Alignment::Center);

        container(line)
            .padding([6, 8])
            .width(Length::Fill)
            .style(theme::Container::Custom(Box::new(RowStyle { selected })))
            .into()
    }

    fn status_badge(&self, status: StatusTag) -> Element<'_, Message> {
        let (label, style) = self.palette.badge(status);
        container(text(label).size(12))
            .padding([2, 10])
            .style(theme::Container::Custom(Box::new(style)))
            .into()
    }

    fn empty_state(&self) -> Element<'_, Message> {
        let controller = &self.controller;
        let message = if controller.records().is_empty() {
            if controller.is_loading() {
                "Loading records…"
            } else {
                "No records."
            }
        } else if controller.filtered().is_empty() {
            "No records match this filter."
        } else {
            "This page is empty."
        };

        let mut content = column![text(message).size(14).style(theme::Text::Color(MUTED))]
            .spacing(8)
            .align_items(Alignment::Center);
        if controller.page() > 0 && controller.page_count() > 0 {
            content = content.push(button("Back to last page").on_press(Message::PreviousPage));
        }

        container(content)
            .width(Length::Fill)
            .padding(24)
            .center_x()
            .into()
    }

    fn pagination_view(&self) -> Element<'_, Message> {
        let controller = &self.controller;
        let window = controller.page_window();

        let previous = button("‹ Previous").style(theme::Button::Secondary);
        let previous = if controller.page() > 0 {
            previous.on_press(Message::PreviousPage)
        } else {
            previous
        };
        let next = button("Next ›").style(theme::Button::Secondary);
        let next = if controller.page() + 1 < controller.page_count() {
            next.on_press(Message::NextPage)
        } else {
            next
        };

        row![
            text("Rows per page")
                .size(13)
                .style(theme::Text::Color(LABEL)),
            pick_list(
                &PageSize::ALL[..],
                Some(controller.page_size()),
                Message::PageSizeChanged,
            ),
            Space::with_width(Length::Fill),
            text(window.label())
                .size(13)
                .style(theme::Text::Color(VALUE)),
            previous,
            next,
        ]
        .spacing(12)
        .align_items(Alignment::Center)
        .into()
    }

    /// The open dialog and the message a backdrop click sends.
    fn dialog_view(&self) -> Option<(Element<'_, Message>, Message)> {
        if let Some(intent) = &self.pending_delete {
            let body = column![
                text("Confirm delete")
                    .size(20)
                    .style(theme::Text::Color(HEADING)),
                text(intent.prompt()).size(14),
                row![
                    Space::with_width(Length::Fill),
                    button("Cancel")
                        .style(theme::Button::Secondary)
                        .on_press(Message::CancelDelete),
                    button("Delete")
                        .style(theme::Button::Destructive)
                        .on_press(Message::ConfirmDelete),
                ]
                .spacing(8),
            ]
            .spacing(14);
            return Some((dialog_frame(body), Message::CancelDelete));
        }

        if let Some(id) = self.controller.annotate_target() {
            return Some((self.annotate_dialog(id), Message::CloseAnnotate));
        }

        if let Some(id) = self.controller.detail_target() {
            return Some((self.detail_dialog(id), Message::CloseDetail));
        }

        None
    }

    fn annotate_dialog(&self, id: &RecordId) -> Element<'_, Message> {
        let form = &self.annotate_form;

        let mut body = column![
            text(format!("Annotate record {id}"))
                .size(20)
                .style(theme::Text::Color(HEADING)),
            text("Description").size(13).style(theme::Text::Color(LABEL)),
            text_input("What was observed", &form.description)
                .on_input(Message::AnnotateDescriptionChanged)
                .padding(6),
            text("Grant").size(13).style(theme::Text::Color(LABEL)),
            text_input("Grant decision", &form.grant)
                .on_input(Message::AnnotateGrantChanged)
                .on_submit(Message::SubmitAnnotate)
                .padding(6),
        ]
        .spacing(8);

        if let Some(error) = &form.error {
            body = body.push(
                text(error)
                    .size(13)
                    .style(theme::Text::Color(DANGER)),
            );
        }

        let submit_label = if form.submitting { "Submitting…" } else { "Submit" };
        let submit = button(submit_label).style(theme::Button::Primary);
        let submit = if form.submitting {
            submit
        } else {
            submit.on_press(Message::SubmitAnnotate)
        };

        body = body.push(
            row![
                Space::with_width(Length::Fill),
                button("Cancel")
                    .style(theme::Button::Secondary)
                    .on_press(Message::CloseAnnotate),
                submit,
            ]
            .spacing(8),
        );

        dialog_frame(body)
    }

    fn detail_dialog(&self, id: &RecordId) -> Element<'_, Message> {
        let title = text(format!("Record {id}"))
            .size(20)
            .style(theme::Text::Color(HEADING));

        let Some(detail) = self.controller.detail() else {
            let body = column![
                title,
                text("Loading details…").size(14).style(theme::Text::Color(MUTED)),
                row![
                    Space::with_width(Length::Fill),
                    button("Close")
                        .style(theme::Button::Secondary)
                        .on_press(Message::CloseDetail),
                ],
            ]
            .spacing(12);
            return dialog_frame(body);
        };

        let status = detail.record.display_status();
        let mark_completed = button("Mark completed").style(theme::Button::Primary);
        let mark_completed = if status == StatusTag::Completed {
            mark_completed
        } else {
            mark_completed.on_press(Message::MarkCompleted(detail.record.id.clone()))
        };

        let body = column![
            row![title, Space::with_width(Length::Fill), self.status_badge(status)]
                .align_items(Alignment::Center),
            detail_fields(detail),
            row![
                Space::with_width(Length::Fill),
                mark_completed,
                button("Close")
                    .style(theme::Button::Secondary)
                    .on_press(Message::CloseDetail),
            ]
            .spacing(8),
        ]
        .spacing(14);

        dialog_frame(body)
    }

    fn debug_tab_view(&self) -> Element<'_, Message> {
        let level_picker = pick_list(
            &LogLevel::ALL[..],
            Some(self.log_level),
            Message::LogLevelChanged,
        )
        .placeholder("Log level");

        let console_header = row![
            text("Console")
                .size(20)
                .style(theme::Text::Color(HEADING)),
            level_picker,
            button("Clear")
                .style(theme::Button::Secondary)
                .on_press(Message::ClearLogs),
        ]
        .spacing(12)
        .align_items(Alignment::Center);

        let console = column![console_header, self.target_filters_view(), self.log_lines_view()]
            .spacing(12)
            .width(Length::FillPortion(2));

        row![console, self.debug_panel_view()]
            .spacing(16)
            .align_items(Alignment::Start)
            .into()
    }

    fn target_filters_view(&self) -> Element<'_, Message> {
        let mut filters = row![
            text("Targets")
                .size(14)
                .style(theme::Text::Color(LABEL))
        ]
        .spacing(12)
        .align_items(Alignment::Center);

        for target in self.sorted_targets() {
            let enabled = self.enabled_targets.contains(&target);
            filters = filters.push(
                checkbox(target.clone(), enabled)
                    .on_toggle(move |value| Message::ToggleTarget(target.clone(), value)),
            );
        }

        container(filters)
            .padding(8)
            .style(theme::Container::Box)
            .into()
    }

    fn log_lines_view(&self) -> Element<'_, Message> {
        let mut lines = column![].spacing(4);

        for entry in self.visible_entries() {
            lines = lines.push(
                text(entry.format_line())
                    .size(13)
                    .horizontal_alignment(Horizontal::Left)
                    .style(theme::Text::Color(level_color(entry.level))),
            );
        }

        scrollable(lines)
            .height(Length::Fill)
            .width(Length::Fill)
            .into()
    }

    fn debug_panel_view(&self) -> Element<'_, Message> {
        let controller = &self.controller;
        let copy_status = self.copy_status.as_deref().unwrap_or("Ready");

        let panel = column![
            text("Session")
                .size(20)
                .style(theme::Text::Color(HEADING)),
            info_line("Schema", self.config.schema.to_string()),
            info_line("Records loaded", controller.records().len().to_string()),
            info_line("Selected", controller.selected_count().to_string()),
            info_line("Requests in flight", controller.in_flight().to_string()),
            info_line("Selection policy", format!("{:?}", self.config.selection_policy)),
            button("Copy diagnostics").on_press(Message::CopyDiagnostics),
            text(format!("Clipboard: {copy_status}"))
                .size(12)
                .style(theme::Text::Color(MUTED)),
        ]
        .spacing(10);

        container(panel)
            .padding(12)
            .width(Length::FillPortion(1))
            .style(theme::Container::Box)
            .into()
    }
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color {
        r: r as f32 / 255.0,
        g: g as f32 / 255.0,
        b: b as f32 / 255.0,
        a: 1.0,
    }
}

fn dialog_frame<'a>(body: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(body)
        .width(Length::Fixed(DIALOG_WIDTH))
        .padding(20)
        .style(theme::Container::Custom(Box::new(DialogStyle)))
        .into()
}

fn header_cell<'a>(label: &str, portion: u16) -> Element<'a, Message> {
    text(label)
        .size(12)
        .width(Length::FillPortion(portion))
        .style(theme::Text::Color(LABEL))
        .into()
}

fn value_cell<'a>(value: Option<&str>, portion: u16) -> Element<'a, Message> {
    text(or_dash(value))
        .size(13)
        .width(Length::FillPortion(portion))
        .style(theme::Text::Color(VALUE))
        .into()
}

fn info_line<'a>(label: &str, value: String) -> Element<'a, Message> {
    row![
        text(label)
            .size(13)
            .width(Length::Fill)
            .style(theme::Text::Color(LABEL)),
        text(value).size(13).style(theme::Text::Color(VALUE)),
    ]
    .spacing(12)
    .align_items(Alignment::Center)
    .into()
}

fn detail_fields<'a>(detail: &RecordDetail) -> Element<'a, Message> {
    let record = &detail.record;
    let mut fields = column![
        info_line("Category", or_dash(record.category.as_deref()).to_string()),
        info_line("Date", or_dash(record.reported_date.as_deref()).to_string()),
        info_line("District", or_dash(record.location_name.as_deref()).to_string()),
        info_line("Station", or_dash(record.location_detail.as_deref()).to_string()),
        info_line("Suspect", or_dash(detail.suspect_name.as_deref()).to_string()),
        info_line("Details", or_dash(detail.suspect_details.as_deref()).to_string()),
        info_line("Details type", or_dash(detail.suspect_details_type.as_deref()).to_string()),
    ]
    .spacing(6);

    fields = fields.push(text("Information").size(13).style(theme::Text::Color(LABEL)));
    fields = fields.push(
        text(or_dash(detail.suspect_info.as_deref()))
            .size(13)
            .style(theme::Text::Color(VALUE)),
    );

    if !detail.media.is_empty() {
        fields = fields.push(text("Media").size(13).style(theme::Text::Color(LABEL)));
        for reference in &detail.media {
            fields = fields.push(text(reference).size(12).style(theme::Text::Color(MUTED)));
        }
    }

    fields.into()
}
