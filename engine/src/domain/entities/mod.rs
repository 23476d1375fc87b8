pub mod process_instance;
pub mod process_spec;

pub use process_instance::ProcessInstance;
pub use process_spec::{ProcessSpec, ProcessSpecBuilder};
