use std::fs;

use crate::cli::RecolorCommand;
use vectorvision::{VectorizeError, VectorizeResult, svg};

/// The main function to run the recolor command.
pub fn run(cmd: RecolorCommand) -> VectorizeResult<()> {
    if cmd.color.is_none() && cmd.opacity.is_none() {
        return Err(VectorizeError::InvalidConfig(
            "nothing to change; pass --color and/or --opacity".into(),
        ));
    }

    let mut document = fs::read_to_string(&cmd.input)?;
    if let Some(color) = cmd.color {
        document = svg::recolor(&document, cmd.id, color)?;
    }
    if let Some(opacity) = cmd.opacity {
        document = svg::set_opacity(&document, cmd.id, opacity)?;
    }

    let output_path = cmd.output.unwrap_or(cmd.input);
    fs::write(&output_path, &document)?;
    println!("Component {} updated in {}", cmd.id, output_path.display());

    Ok(())
}
