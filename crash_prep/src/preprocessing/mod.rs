pub mod pipeline;

pub use pipeline::{
    lowercase_column_names, PipelineReport, PreparePipeline, PrepareOutput, PrepareReport,
};
