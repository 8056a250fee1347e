pub mod outreach_pipeline;

pub use outreach_pipeline::{email_file_name, EmailSink, OutreachPipeline};
