pub mod loaders;
pub mod row;

pub use loaders::load_input_rows;
pub use row::{InputRecord, InputRow, InvoiceStatus, MalformedRow, OutcomeKind, ResultRow};
