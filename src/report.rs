use vectorvision::VectorizeError;

pub fn report_error(err: &VectorizeError) {
    match err {
        VectorizeError::ResourceLimit { what, limit, found } => {
            eprintln!("Input is too large: {what} {found} exceeds the limit of {limit}.");
            eprintln!();
            eprintln!("Downscale the image before tracing it.");
        }
        VectorizeError::TraceFailure { thresholds } => {
            eprintln!("Tracing failed for all {thresholds} thresholds.");
            eprintln!();
            eprintln!("Try a larger --tolerance or fewer --thresholds; run with RUST_LOG=debug for details.");
        }
        VectorizeError::ComponentNotFound { id } => {
            eprintln!("No component with id {id} in the document.");
            eprintln!("Component ids are listed in the JSON written by `vectorvision trace --components`.");
        }
        _ => {
            eprintln!("{err}");
        }
    }
}
