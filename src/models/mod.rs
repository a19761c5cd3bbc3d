pub mod invocation;
pub mod manifest;
pub mod row;
pub mod table;

pub use invocation::{InvocationContext, RunResponse, TriggerEvent};
pub use manifest::{ExportRecord, Manifest};
pub use row::{CellValue, Row};
pub use table::TableName;
