pub const GATEWAY: &str = "gateway";
pub const RECORDS: &str = "records";
pub const CONFIG: &str = "config";
pub const UI: &str = "ui";

pub const ALL: [&str; 4] = [GATEWAY, RECORDS, CONFIG, UI];
