use std::path::{Path, PathBuf};

use vectorvision::{Vectorizer, VectorizeOptions};

use crate::cli::SweepArgs;

/// Build a Vectorizer from the sweep flags.
pub fn build_vectorizer(args: &SweepArgs) -> Vectorizer {
    let mut options = VectorizeOptions::default()
        .with_max_working_edge(args.max_edge)
        .with_thresholds(args.thresholds.clone())
        .with_noise_floor_ratio(args.noise_floor)
        .with_simplify_tolerance(args.tolerance)
        .with_max_path_vertices(args.max_vertices)
        .with_fallback_fill(args.fallback_fill)
        .with_alpha_cutoff(args.alpha_cutoff)
        .with_resize_filter(args.resample_filter.into())
        .with_sweep_order(args.sweep_order.into())
        .with_parallel(!args.no_parallel);
    if let Some(palette) = &args.palette {
        options = options.with_palette(palette.clone());
    }
    Vectorizer::new().with_options(options)
}

/// Derive a variant file path by appending a suffix before the extension.
pub fn derive_variant_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let mut derived = input.to_path_buf();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| suffix.to_string());
    let filename = format!("{}-{}.{}", stem, suffix, extension);
    derived.set_file_name(filename);
    derived
}

/// Derive an SVG file path by changing the extension to "svg".
pub fn derive_svg_path(input: &Path) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension("svg");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use vectorvision::HexColor;

    use crate::cli::{Cli, Commands};

    fn sweep_args(flags: &[&str]) -> SweepArgs {
        let argv = ["vectorvision", "trace", "in.png"].iter().chain(flags).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Trace(cmd) => cmd.sweep,
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn defaults_match_library_defaults() {
        let options = build_vectorizer(&sweep_args(&[])).options().clone();
        let defaults = VectorizeOptions::default();
        assert_eq!(options.thresholds, defaults.thresholds);
        assert_eq!(options.max_path_vertices, defaults.max_path_vertices);
        assert_eq!(options.fallback_fill, defaults.fallback_fill);
    }

    #[test]
    fn vertex_limit_and_fallback_flags_are_applied() {
        let args = sweep_args(&["--max-vertices", "64", "--fallback-fill", "#000"]);
        let options = build_vectorizer(&args).options().clone();
        assert_eq!(options.max_path_vertices, 64);
        assert_eq!(options.fallback_fill, HexColor::new(0, 0, 0));
    }

    #[test]
    fn variant_path_keeps_directory() {
        let path = derive_variant_path(Path::new("out/cat.png"), "components", "json");
        assert_eq!(path, PathBuf::from("out/cat-components.json"));
    }

    #[test]
    fn svg_path_swaps_extension() {
        assert_eq!(derive_svg_path(Path::new("a/b.jpeg")), PathBuf::from("a/b.svg"));
    }
}
