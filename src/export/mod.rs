pub mod jsonl;

pub use jsonl::{export_file_name, export_jsonl, write_jsonl};
