use iced::advanced::layout::{self, Layout};
use iced::advanced::mouse;
use iced::advanced::overlay;
use iced::advanced::renderer;
use iced::advanced::widget::{self, Widget};
use iced::advanced::{Clipboard, Shell};
use iced::event::{self, Event};
use iced::{Alignment, Color, Element, Length, Point, Rectangle, Size, Vector};

/// Shows `dialog` centered over a dimmed `base`. Clicking the backdrop
/// publishes `on_blur` when one is set.
#[allow(missing_debug_implementations)]
pub(crate) struct Modal<'a, Message, Theme, Renderer> {
    base: Element<'a, Message, Theme, Renderer>,
    dialog: Element<'a, Message, Theme, Renderer>,
    on_blur: Option<Message>,
    backdrop: Color,
}

impl<'a, Message, Theme, Renderer> Modal<'a, Message, Theme, Renderer> {
    pub(crate) fn new(
        base: impl Into<Element<'a, Message, Theme, Renderer>>,
        dialog: impl Into<Element<'a, Message, Theme, Renderer>>,
    ) -> Self {
        Self {
            base: base.into(),
            dialog: dialog.into(),
            on_blur: None,
            backdrop: Color {
                a: 0.55,
                ..Color::BLACK
            },
        }
    }

    pub(crate) fn on_blur(mut self, message: Message) -> Self {
        self.on_blur = Some(message);
        self
    }
}

impl<'a, Message, Theme, Renderer> Widget<Message, Theme, Renderer>
    for Modal<'a, Message, Theme, Renderer>
where
    Message: Clone,
    Renderer: iced::advanced::Renderer,
{
    fn children(&self) -> Vec<widget::Tree> {
        vec![
            widget::Tree::new(&self.base),
            widget::Tree::new(&self.dialog),
        ]
    }

    fn diff(&self, tree: &mut widget::Tree) {
        tree.diff_children(&[self.base.as_widget(), self.dialog.as_widget()]);
    }

    fn size(&self) -> Size<Length> {
        self.base.as_widget().size()
    }

    fn size_hint(&self) -> Size<Length> {
        self.base.as_widget().size_hint()
    }

    fn layout(
        &self,
        tree: &mut widget::Tree,
        renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        self.base
            .as_widget()
            .layout(&mut tree.children[0], renderer, limits)
    }

    fn on_event(
        &mut self,
        tree: &mut widget::Tree,
        event: Event,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        renderer: &Renderer,
        clipboard: &mut dyn Clipboard,
        shell: &mut Shell<'_, Message>,
        viewport: &Rectangle,
    ) -> event::Status {
        self.base.as_widget_mut().on_event(
            &mut tree.children[0],
            event,
            layout,
            cursor,
            renderer,
            clipboard,
            shell,
            viewport,
        )
    }

    fn mouse_interaction(
        &self,
        tree: &widget::Tree,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        viewport: &Rectangle,
        renderer: &Renderer,
    ) -> mouse::Interaction {
        self.base.as_widget().mouse_interaction(
            &tree.children[0],
            layout,
            cursor,
            viewport,
            renderer,
        )
    }

    fn draw(
        &self,
        tree: &widget::Tree,
        renderer: &mut Renderer,
        theme: &Theme,
        inherited_style: &renderer::Style,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        viewport: &Rectangle,
    ) {
        self.base.as_widget().draw(
            &tree.children[0],
            renderer,
            theme,
            inherited_style,
            layout,
            cursor,
            viewport,
        );
    }

    fn overlay<'b>(
        &'b mut self,
        tree: &'b mut widget::Tree,
        layout: Layout<'_>,
        _renderer: &Renderer,
        translation: Vector,
    ) -> Option<overlay::Element<'b, Message, Theme, Renderer>> {
        let state = tree.children.get_mut(1)?;
        Some(overlay::Element::new(Box::new(DialogLayer {
            position: layout.position() + translation,
            size: layout.bounds().size(),
            dialog: &mut self.dialog,
            state,
            on_blur: self.on_blur.clone(),
            backdrop: self.backdrop,
        })))
    }
}

impl<'a, Message, Theme, Renderer> From<Modal<'a, Message, Theme, Renderer>>
    for Element<'a, Message, Theme, Renderer>
where
    Message: Clone + 'a,
    Theme: 'a,
    Renderer: iced::advanced::Renderer + 'a,
{
    fn from(modal: Modal<'a, Message, Theme, Renderer>) -> Element<'a, Message, Theme, Renderer> {
        Element::new(modal)
    }
}

struct DialogLayer<'a, 'b, Message, Theme, Renderer> {
    position: Point,
    size: Size,
    dialog: &'b mut Element<'a, Message, Theme, Renderer>,
    state: &'b mut widget::Tree,
    on_blur: Option<Message>,
    backdrop: Color,
}

impl<'a, 'b, Message, Theme, Renderer> overlay::Overlay<Message, Theme, Renderer>
    for DialogLayer<'a, 'b, Message, Theme, Renderer>
where
    Message: Clone,
    Renderer: iced::advanced::Renderer,
{
    fn layout(&mut self, renderer: &Renderer, _bounds: Size) -> layout::Node {
        let limits = layout::Limits::new(Size::ZERO, self.size)
            .width(Length::Fill)
            .height(Length::Fill);

        let dialog = self
            .dialog
            .as_widget()
            .layout(self.state, renderer, &limits)
            .align(Alignment::Center, Alignment::Center, limits.max());

        layout::Node::with_children(self.size, vec![dialog]).move_to(self.position)
    }

    fn on_event(
        &mut self,
        event: Event,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        renderer: &Renderer,
        clipboard: &mut dyn Clipboard,
        shell: &mut Shell<'_, Message>,
    ) -> event::Status {
        let Some(dialog_layout) = layout.children().next() else {
            return event::Status::Ignored;
        };

        if let Some(message) = self.on_blur.as_ref() {
            if let Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = &event {
                if !cursor.is_over(dialog_layout.bounds()) {
                    shell.publish(message.clone());
                    return event::Status::Captured;
                }
            }
        }

        self.dialog.as_widget_mut().on_event(
            self.state,
            event,
            dialog_layout,
            cursor,
            renderer,
            clipboard,
            shell,
            &layout.bounds(),
        )
    }

    fn draw(
        &self,
        renderer: &mut Renderer,
        theme: &Theme,
        inherited_style: &renderer::Style,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
    ) {
        renderer.fill_quad(
            renderer::Quad {
                bounds: layout.bounds(),
                ..renderer::Quad::default()
            },
            self.backdrop,
        );

        if let Some(dialog_layout) = layout.children().next() {
            self.dialog.as_widget().draw(
                self.state,
                renderer,
                theme,
                inherited_style,
                dialog_layout,
                cursor,
                &layout.bounds(),
            );
        }
    }

    fn mouse_interaction(
        &self,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        viewport: &Rectangle,
        renderer: &Renderer,
    ) -> mouse::Interaction {
        match layout.children().next() {
            Some(dialog_layout) => self.dialog.as_widget().mouse_interaction(
                self.state,
                dialog_layout,
                cursor,
                viewport,
                renderer,
            ),
            None => mouse::Interaction::default(),
        }
    }

    fn overlay<'c>(
        &'c mut self,
        layout: Layout<'_>,
        renderer: &Renderer,
    ) -> Option<overlay::Element<'c, Message, Theme, Renderer>> {
        let dialog_layout = layout.children().next()?;
        self.dialog
            .as_widget_mut()
            .overlay(self.state, dialog_layout, renderer, Vector::ZERO)
    }
}
