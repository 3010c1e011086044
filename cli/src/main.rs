//! plan3d CLI - PDF house plan to 3D mesh converter

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use plan3d::scale::ScaleResolver;
use plan3d::{
    decode_bytes, export, Conversion, ConvertOptions, Converter, ExportFormat, ExportOptions,
    LengthUnit, PageRole,
};

#[derive(Parser)]
#[command(name = "plan3d")]
#[command(version)]
#[command(about = "Convert PDF house plans into 3D meshes (OBJ, STL, JSON)", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a plan set into a mesh
    Convert {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to the input name with the format's extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "obj")]
        format: Format,

        /// Unit of the written coordinates
        #[arg(short, long, value_enum, default_value = "mm")]
        unit: Unit,

        /// Write warnings as JSON to this file instead of the terminal
        #[arg(long, value_name = "FILE")]
        warnings: Option<PathBuf>,

        #[command(flatten)]
        settings: Settings,
    },

    /// Show what the decoder sees in a PDF
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        settings: Settings,
    },

    /// Show version information
    Version,
}

/// Conversion settings shared by the subcommands.
#[derive(Args, Debug, Default, Clone)]
struct Settings {
    /// JSON file with conversion options
    #[arg(long, value_name = "FILE", env = "PLAN3D_CONFIG")]
    config: Option<PathBuf>,

    /// Fixed scale in millimetres per page unit
    #[arg(long, value_name = "MM", env = "PLAN3D_SCALE")]
    scale: Option<f64>,

    /// Fixed drawing scale 1:N on point-based pages
    #[arg(long, value_name = "N", env = "PLAN3D_DRAWING_SCALE", conflicts_with = "scale")]
    drawing_scale: Option<f64>,

    /// Wall height in millimetres
    #[arg(long, value_name = "MM", env = "PLAN3D_WALL_HEIGHT")]
    wall_height: Option<f64>,

    /// Slab thickness between floors in millimetres
    #[arg(long, value_name = "MM", env = "PLAN3D_SLAB")]
    slab: Option<f64>,

    /// Put a page (0-based) on a floor, e.g. `--floor 2=0`
    #[arg(long = "floor", value_name = "PAGE=FLOOR", value_parser = parse_floor)]
    floors: Vec<(usize, usize)>,

    /// Skip undecodable pages instead of failing
    #[arg(long)]
    lenient: bool,

    /// Disable parallel processing
    #[arg(long)]
    sequential: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum Format {
    /// Wavefront OBJ, one object per floor
    Obj,
    /// ASCII STL
    Stl,
    /// Full model as JSON
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Obj => ExportFormat::Obj,
            Format::Stl => ExportFormat::Stl,
            Format::Json => ExportFormat::Json,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum Unit {
    Mm,
    Cm,
    M,
    Ft,
    In,
}

impl From<Unit> for LengthUnit {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Mm => LengthUnit::Millimetre,
            Unit::Cm => LengthUnit::Centimetre,
            Unit::M => LengthUnit::Metre,
            Unit::Ft => LengthUnit::Foot,
            Unit::In => LengthUnit::Inch,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            format,
            unit,
            warnings,
            settings,
        }) => cmd_convert(
            &input,
            output.as_deref(),
            format,
            unit,
            warnings.as_deref(),
            &settings,
        ),
        Some(Commands::Info { input, settings }) => cmd_info(&input, &settings),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert to OBJ if input is provided
            if let Some(input) = cli.input {
                cmd_convert(
                    &input,
                    None,
                    Format::Obj,
                    Unit::Mm,
                    None,
                    &Settings::default(),
                )
            } else {
                println!("{}", "Usage: plan3d <FILE>".yellow());
                println!("       plan3d --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_floor(s: &str) -> Result<(usize, usize), String> {
    let (page, floor) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PAGE=FLOOR, got '{}'", s))?;
    let page = page
        .trim()
        .parse()
        .map_err(|e| format!("bad page '{}': {}", page, e))?;
    let floor = floor
        .trim()
        .parse()
        .map_err(|e| format!("bad floor '{}': {}", floor, e))?;
    Ok((page, floor))
}

/// Build conversion options: config file first, then flag overrides.
fn load_options(settings: &Settings) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let mut options = match &settings.config {
        Some(path) => ConvertOptions::from_json(&fs::read_to_string(path)?)?,
        None => ConvertOptions::default(),
    };

    if let Some(ratio) = settings.scale {
        options = options.with_scale(ratio);
    }
    if let Some(denominator) = settings.drawing_scale {
        options = options.with_drawing_scale(denominator);
    }
    if let Some(mm) = settings.wall_height {
        options = options.with_wall_height(mm);
    }
    if let Some(mm) = settings.slab {
        options = options.with_slab_thickness(mm);
    }
    for &(page, floor) in &settings.floors {
        options = options.with_page_floor(page, floor);
    }
    if settings.lenient {
        options = options.lenient();
    }
    if settings.sequential {
        options = options.sequential();
    }

    options.validate()?;
    Ok(options)
}

fn default_output(input: &Path, format: Format) -> PathBuf {
    input.with_extension(ExportFormat::from(format).extension())
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    format: Format,
    unit: Unit,
    warnings_path: Option<&Path>,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = load_options(settings)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input, format));

    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Reading PDF...");
    let data = fs::read(input)?;
    pb.inc(1);

    pb.set_message("Building model...");
    let conversion = Converter::new(options).convert(&data)?;
    pb.inc(1);

    pb.set_message("Writing mesh...");
    let export_options = ExportOptions::new().with_unit(unit.into());
    let text = export::export(&conversion.model, format.into(), &export_options)?;
    fs::write(&output, text)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    report(&conversion, warnings_path)?;
    println!("{} {}", "Saved to".green(), output.display());
    Ok(())
}

fn report(
    conversion: &Conversion,
    warnings_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = &conversion.model;
    let stats = model.stats();
    let size = model.bounding_box.size();

    println!("\n{}", "Model".green().bold());
    println!("  {} {} floors", "├─".dimmed(), model.floor_count());
    println!(
        "  {} {} walls, {} openings, {} rooms",
        "├─".dimmed(),
        stats.wall_prisms,
        stats.opening_voids,
        stats.floor_caps
    );
    println!(
        "  {} {} vertices, {} triangles",
        "├─".dimmed(),
        model.mesh.vertex_count(),
        model.mesh.face_count()
    );
    println!(
        "  {} {:.0} x {:.0} x {:.0} mm",
        "└─".dimmed(),
        size.x,
        size.y,
        size.z
    );

    match warnings_path {
        Some(path) => {
            fs::write(path, serde_json::to_string_pretty(&conversion.warnings)?)?;
            println!(
                "{} {} warnings to {}",
                "Wrote".green(),
                conversion.warnings.len(),
                path.display()
            );
        }
        None => {
            for warning in &conversion.warnings {
                eprintln!("{}: {}", "Warning".yellow().bold(), warning);
            }
        }
    }
    Ok(())
}

fn cmd_info(input: &Path, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let options = load_options(settings)?.lenient();
    let data = fs::read(input)?;
    let doc = decode_bytes(&data, &options)?;
    let resolver = ScaleResolver::from_options(&options);
    let roles = Converter::new(options.clone()).page_roles(&doc.pages);

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), doc.metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), doc.page_count());

    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = doc.metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = doc.metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref created) = doc.metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for (page, role) in doc.pages.iter().zip(&roles) {
        let scale = resolver.resolve_page(page);
        println!(
            "{} {}: {:?}, {} geometry, {} text runs, {} images, scale {:.4} mm/unit ({})",
            "Page".bold(),
            page.index,
            role,
            page.geometry_count(),
            page.texts().count(),
            page.image_count,
            scale.ratio,
            scale.confidence
        );
    }
    for skipped in &doc.skipped_pages {
        println!(
            "{} {}: {}",
            "Page".bold(),
            skipped.index,
            "skipped".yellow()
        );
    }

    let plans = doc
        .pages
        .iter()
        .zip(&roles)
        .filter(|(_, role)| **role == PageRole::Plan)
        .map(|(page, _)| page);
    let scale = resolver.resolve_document(plans);
    println!();
    println!(
        "{}: {:.4} mm per page unit ({})",
        "Scale".bold(),
        scale.ratio,
        scale.confidence
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "plan3d".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF house plan to 3D mesh converter");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_floor() {
        assert_eq!(parse_floor("2=0"), Ok((2, 0)));
        assert_eq!(parse_floor(" 3 = 1 "), Ok((3, 1)));
        assert!(parse_floor("2").is_err());
        assert!(parse_floor("a=1").is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"default_wall_height_mm": 2400.0, "slab_thickness_mm": 250.0}}"#
        )
        .unwrap();

        let settings = Settings {
            config: Some(file.path().to_path_buf()),
            wall_height: Some(3000.0),
            floors: vec![(1, 0)],
            sequential: true,
            ..Default::default()
        };
        let options = load_options(&settings).unwrap();

        assert_eq!(options.default_wall_height_mm, 3000.0);
        assert_eq!(options.slab_thickness_mm, 250.0);
        assert_eq!(options.page_floors.get(&1), Some(&0));
        assert!(!options.parallel);
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        let settings = Settings {
            slab: Some(-5.0),
            ..Default::default()
        };
        assert!(load_options(&settings).is_err());
    }

    #[test]
    fn test_default_output_uses_format_extension() {
        assert_eq!(
            default_output(Path::new("plans/house.pdf"), Format::Stl),
            PathBuf::from("plans/house.stl")
        );
    }
}
