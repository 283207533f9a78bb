//! docrewrite CLI - edit text in PDFs and scanned images

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use docrewrite::model::{DocumentFormat, TargetFormat, WarningCategory};
use docrewrite::{
    detect_format_from_path, EditSet, Editor, EditorConfig, ExtractionReport, FontLibrary,
    JsonFormat, LayoutModel, OcrOptions, RegenerateOptions, Warning,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "docrewrite")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Edit text in PDFs and images while keeping their layout", long_about = None)]
struct Cli {
    /// Tesseract executable used for image OCR
    #[arg(long, global = true, env = "DOCREWRITE_TESSERACT", value_name = "PATH")]
    tesseract: Option<PathBuf>,

    /// OCR language(s), e.g. "eng" or "eng+deu"
    #[arg(long, global = true, env = "DOCREWRITE_OCR_LANG", value_name = "LANG")]
    lang: Option<String>,

    /// Extra directory of fonts for raster output
    #[arg(long, global = true, value_name = "DIR")]
    font_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract editable fields and images
    Inspect {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Declared format (detected from the file when omitted)
        #[arg(short, long, value_enum)]
        format: Option<InputFormat>,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,

        /// Print the layout as compact JSON
        #[arg(long, conflicts_with = "json")]
        compact: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show warnings an edit would produce
    Preview {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// JSON file of edited values
        #[arg(short, long, value_name = "EDITS")]
        edits: PathBuf,
    },

    /// Regenerate the document with edited values
    Apply {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// JSON file of edited values
        #[arg(short, long, value_name = "EDITS")]
        edits: PathBuf,

        /// Output formats, comma separated (defaults to the input's own format)
        #[arg(long = "to", value_delimiter = ',', value_name = "FORMATS")]
        targets: Vec<TargetFormat>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Print the font substitution table
    Fonts {
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check which extraction backends can run
    Health,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    Pdf,
    Png,
    #[value(alias = "jpg")]
    Jpeg,
    Bmp,
    #[value(alias = "tif")]
    Tiff,
}

impl From<InputFormat> for DocumentFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Pdf => DocumentFormat::Pdf,
            InputFormat::Png => DocumentFormat::Png,
            InputFormat::Jpeg => DocumentFormat::Jpeg,
            InputFormat::Bmp => DocumentFormat::Bmp,
            InputFormat::Tiff => DocumentFormat::Tiff,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = editor_config(&cli);

    let result = match cli.command {
        Commands::Inspect {
            input,
            format,
            json,
            compact,
            output,
        } => cmd_inspect(
            &config,
            &input,
            format.map(Into::into),
            (json || compact).then_some(if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            }),
            output.as_deref(),
        ),
        Commands::Preview { input, edits } => cmd_preview(&config, &input, &edits),
        Commands::Apply {
            input,
            edits,
            targets,
            output,
        } => cmd_apply(&config, &input, &edits, &targets, output.as_deref()),
        Commands::Fonts { json } => cmd_fonts(&config, json),
        Commands::Health => {
            cmd_health(&config);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn editor_config(cli: &Cli) -> EditorConfig {
    let mut ocr = OcrOptions::new();
    if let Some(ref path) = cli.tesseract {
        ocr = ocr.with_tesseract_path(path);
    }
    if let Some(ref lang) = cli.lang {
        ocr = ocr.with_language(lang);
    }

    let mut regenerate = RegenerateOptions::new();
    if let Some(ref dir) = cli.font_dir {
        regenerate = regenerate.with_font_dir(dir);
    }

    EditorConfig::new().with_ocr(ocr).with_regenerate(regenerate)
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

/// Read a document and open an editing session for it.
fn upload(
    editor: &Editor,
    input: &Path,
    format: Option<DocumentFormat>,
) -> CliResult<docrewrite::Upload> {
    let format = match format {
        Some(format) => format,
        None => detect_format_from_path(input)?,
    };
    let bytes = fs::read(input)?;

    let pb = spinner(&format!("Extracting {}...", format.as_str().to_uppercase()));
    let upload = editor.upload(bytes, format);
    pb.finish_and_clear();
    Ok(upload?)
}

fn cmd_inspect(
    config: &EditorConfig,
    input: &Path,
    format: Option<DocumentFormat>,
    json: Option<JsonFormat>,
    output: Option<&Path>,
) -> CliResult<()> {
    let editor = Editor::new(config.clone());
    let upload = upload(&editor, input, format)?;
    editor.clear_session(upload.session_id)?;

    let rendered = match json {
        Some(format) => docrewrite::render::to_json(
            &ExtractionReport::new(&upload.layout, &upload.warnings),
            format,
        )?,
        None => docrewrite::render::to_text(&upload.layout, &upload.warnings),
    };

    if let Some(path) = output {
        fs::write(path, &rendered)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", rendered);
    }

    Ok(())
}

fn cmd_preview(config: &EditorConfig, input: &Path, edits_path: &Path) -> CliResult<()> {
    let editor = Editor::new(config.clone());
    let upload = upload(&editor, input, None)?;
    let edits = read_edits(&upload.layout, edits_path)?;

    let warnings = editor.preview(upload.session_id, &edits)?;
    editor.clear_session(upload.session_id)?;

    if warnings.is_empty() {
        println!("{}", "No warnings".green());
        return Ok(());
    }
    for warning in &warnings {
        print_warning(warning);
    }
    println!("\n{} warning(s)", warnings.len());
    Ok(())
}

fn cmd_apply(
    config: &EditorConfig,
    input: &Path,
    edits_path: &Path,
    targets: &[TargetFormat],
    output: Option<&Path>,
) -> CliResult<()> {
    let editor = Editor::new(config.clone());
    let upload = upload(&editor, input, None)?;
    let edits = read_edits(&upload.layout, edits_path)?;

    let targets = if targets.is_empty() {
        vec![upload.layout.format.native_target()]
    } else {
        targets.to_vec()
    };

    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_edited", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let pb = spinner("Regenerating...");
    let outputs = editor.regenerate_many(upload.session_id, &edits, &targets);
    pb.finish_and_clear();
    editor.clear_session(upload.session_id)?;
    let outputs = outputs?;

    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    println!("{}", "Output files:".green().bold());
    for (i, document) in outputs.iter().enumerate() {
        let name = format!("{}.{}", stem, document.extension());
        fs::write(output_dir.join(&name), &document.bytes)?;
        let branch = if i + 1 == outputs.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), name);
    }

    Ok(())
}

fn cmd_fonts(config: &EditorConfig, json: bool) -> CliResult<()> {
    let table = &config.font_table;
    if json {
        println!("{}", table.to_json()?);
        return Ok(());
    }

    println!("{} (version {})", "Font Table".cyan().bold(), table.version);
    println!("{}", "─".repeat(40).dimmed());
    for class in [
        docrewrite::model::FontClass::Sans,
        docrewrite::model::FontClass::Serif,
        docrewrite::model::FontClass::Mono,
    ] {
        println!("{}: {}", class.as_str().bold(), table.families.get(class));
    }
    println!("{}: {}", "Default".bold(), table.default_class);
    println!(
        "{}: {} exact, {} lineage, {} keyword rules",
        "Entries".bold(),
        table.exact.len(),
        table.lineage.len(),
        table.keywords.len()
    );

    let library = FontLibrary::new(&config.regenerate);
    println!(
        "{}: {} faces for raster output",
        "Installed".bold(),
        library.len()
    );
    Ok(())
}

fn cmd_health(config: &EditorConfig) {
    let health = Editor::new(config.clone()).health();
    let status = |ok: bool| if ok { "ok".green() } else { "unavailable".red() };

    println!("{}", "Backends".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "PDF".bold(), status(health.pdf_available));
    println!("{}: {}", "OCR".bold(), status(health.ocr_available));
    println!("{}: {}", "All".bold(), status(health.extractor_available));
}

fn print_warning(warning: &Warning) {
    let tag = match warning.category {
        WarningCategory::FontSubstitution => "font".yellow(),
        WarningCategory::LowConfidence => "ocr".magenta(),
        WarningCategory::EmptyResult => "empty".red(),
        WarningCategory::UnencodableText => "pdf".red(),
    };
    println!("[{}] {}", tag, warning);
}

/// Read an edits file into an edit set for `layout`.
///
/// The file holds `{"fields": {id: value}, "images": {id: path}}`; a bare
/// object of `id: value` pairs is accepted too. Image paths are relative to
/// the edits file.
fn read_edits(layout: &LayoutModel, path: &Path) -> CliResult<EditSet> {
    let json: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let object = json
        .as_object()
        .ok_or("edits file must contain a JSON object")?;

    let fields = match object.get("fields") {
        Some(Value::Object(fields)) => fields,
        Some(_) => return Err("\"fields\" must be an object".into()),
        None => object,
    };

    let mut edits = layout.edits();
    for (id, value) in fields {
        if id == "images" {
            continue;
        }
        let value = value
            .as_str()
            .ok_or_else(|| format!("value for '{}' must be a string", id))?;
        edits.set_value(id, value)?;
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let images: BTreeMap<&String, &Value> = match object.get("images") {
        Some(Value::Object(images)) => images.iter().collect(),
        Some(_) => return Err("\"images\" must be an object".into()),
        None => BTreeMap::new(),
    };
    for (id, image_path) in images {
        let image_path = image_path
            .as_str()
            .ok_or_else(|| format!("image path for '{}' must be a string", id))?;
        edits.replace_image(id.clone(), fs::read(base.join(image_path))?);
    }

    Ok(edits)
}
