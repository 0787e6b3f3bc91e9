use crate::cli::TraceCommand;
use vectorvision::VectorizeResult;

use super::utils::{build_vectorizer, derive_svg_path, derive_variant_path};

/// The main function to run the trace command.
pub fn run(cmd: TraceCommand) -> VectorizeResult<()> {
    let vectorizer = build_vectorizer(&cmd.sweep);
    let traced = vectorizer.for_path(&cmd.input)?;

    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_svg_path(&cmd.input));
    traced.save_svg(&output_path)?;
    println!(
        "SVG saved to {} ({} components, {}x{})",
        output_path.display(),
        traced.document().components().len(),
        traced.width(),
        traced.height()
    );

    let components_path = match &cmd.components {
        Some(Some(path)) => Some(path.clone()),
        Some(None) => Some(derive_variant_path(&cmd.input, "components", "json")),
        None => None,
    };
    if let Some(path) = &components_path {
        traced.save_components(path)?;
        println!("Component list saved to {}", path.display());
    }

    let report = traced.report();
    for (threshold, err) in &report.failed {
        eprintln!("Warning: threshold {threshold} was dropped: {err}");
    }
    if report.fallback_used {
        eprintln!("Warning: nothing was traced; the document holds a single full-size rectangle.");
    }

    Ok(())
}
