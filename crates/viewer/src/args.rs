use anyhow::{Result, bail};
use canvas_layout::LayoutType;
use std::path::PathBuf;

pub const USAGE: &str = "canvas-viewer\n\
\n\
USAGE:\n\
  canvas-viewer <scene.json> [--layout <kind>] [--config <cfg.json>] [--svg <out.svg>] [--analyze]\n\
\n\
NOTES:\n\
  - <kind> is one of grid, hierarchical, force-directed, circular, radial, tree, flow, organic (default grid).\n\
  - The layout result is printed to stdout as JSON; --analyze adds a space analysis of the placed nodes.\n\
  - Set RUST_LOG to see engine logs on stderr.\n\
";

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub scene: PathBuf,
    pub layout: LayoutType,
    pub config: Option<PathBuf>,
    pub svg: Option<PathBuf>,
    pub analyze: bool,
}

/// Parse everything after the program name. `Ok(None)` means help was
/// requested.
pub fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<Option<Args>> {
    let mut scene = None;
    let mut layout = LayoutType::Grid;
    let mut config = None;
    let mut svg = None;
    let mut analyze = false;

    let mut it = argv.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--layout" => {
                let Some(kind) = it.next() else {
                    bail!("--layout needs a value");
                };
                layout = kind.parse()?;
            }
            "--config" => {
                let Some(path) = it.next() else {
                    bail!("--config needs a path");
                };
                config = Some(PathBuf::from(path));
            }
            "--svg" => {
                let Some(path) = it.next() else {
                    bail!("--svg needs a path");
                };
                svg = Some(PathBuf::from(path));
            }
            "--analyze" => analyze = true,
            flag if flag.starts_with("--") => bail!("unknown option `{flag}`"),
            path => {
                if scene.is_some() {
                    bail!("more than one scene given");
                }
                scene = Some(PathBuf::from(path));
            }
        }
    }

    let Some(scene) = scene else {
        bail!("missing <scene.json>");
    };
    Ok(Some(Args {
        scene,
        layout,
        config,
        svg,
        analyze,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["scene.json"]).unwrap().unwrap();
        assert_eq!(args.layout, LayoutType::Grid);
        assert_eq!(args.scene, PathBuf::from("scene.json"));
        assert!(args.svg.is_none() && !args.analyze);
    }

    #[test]
    fn test_all_options() {
        let args = parse(&[
            "--layout", "force", "in.json", "--config", "c.json", "--svg", "o.svg",
            "--analyze",
        ])
        .unwrap()
        .unwrap();
        assert_eq!(args.layout, LayoutType::ForceDirected);
        assert_eq!(args.config, Some(PathBuf::from("c.json")));
        assert_eq!(args.svg, Some(PathBuf::from("o.svg")));
        assert!(args.analyze);
    }

    #[test]
    fn test_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["a.json", "b.json"]).is_err());
        assert!(parse(&["a.json", "--layout"]).is_err());
        assert!(parse(&["a.json", "--layout", "spiral"]).is_err());
        assert!(parse(&["a.json", "--frobnicate"]).is_err());
        assert_eq!(parse(&["--help"]).unwrap(), None);
    }
}
