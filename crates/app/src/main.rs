use std::fmt;
use std::sync::Arc;

use course_core::Clock;
use course_core::model::{CourseRequest, Language, StudentLevel};
use course_core::session::ViewState;
use services::{ChatCourseGenerator, CourseFlow, StudyService};
use storage::repository::Storage;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLevel { raw: String },
    InvalidLanguage { raw: String },
    InvalidIndex { raw: String },
    InvalidDbUrl { raw: String },
    MissingTopic,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLevel { raw } => {
                write!(f, "invalid --level value: {raw} (beginner|intermediate|advanced)")
            }
            ArgsError::InvalidLanguage { raw } => {
                write!(f, "invalid --language value: {raw} (es|en|fr)")
            }
            ArgsError::InvalidIndex { raw } => write!(f, "invalid course index: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingTopic => write!(f, "generate requires --topic"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- generate --topic <topic> [options]");
    eprintln!("  cargo run -p app -- courses  [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- resume <index> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Options for generate:");
    eprintln!("  --level <beginner|intermediate|advanced>   (default: beginner)");
    eprintln!("  --profile <text>  --objective <text>  --time <text>  --format <text>");
    eprintln!("  --language <es|en|fr>                      (default: es)");
    eprintln!("  --db <sqlite_url>                          (default: sqlite:courses.sqlite3)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  COURSE_DB_URL, COURSE_AI_API_KEY, COURSE_AI_BASE_URL, COURSE_AI_MODEL,");
    eprintln!("  COURSE_AI_TIMEOUT_SECS, COURSE_SYNC_URL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Generate,
    Courses,
    Resume,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "generate" => Some(Self::Generate),
            "courses" => Some(Self::Courses),
            "resume" => Some(Self::Resume),
            _ => None,
        }
    }
}

struct CommonArgs {
    db_url: String,
}

struct GenerateArgs {
    common: CommonArgs,
    request: CourseRequest,
}

struct ResumeArgs {
    common: CommonArgs,
    index: usize,
}

fn default_db_url() -> String {
    std::env::var("COURSE_DB_URL")
        .ok()
        .map_or_else(|| "sqlite://courses.sqlite3".into(), normalize_sqlite_url)
}

fn parse_generate(args: &mut impl Iterator<Item = String>) -> Result<GenerateArgs, ArgsError> {
    let mut db_url = default_db_url();
    let mut topic: Option<String> = None;
    let mut level = StudentLevel::Beginner;
    let mut profile = String::new();
    let mut objective = String::new();
    let mut available_time = String::new();
    let mut format = String::new();
    let mut language = Language::Es;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--topic" => topic = Some(require_value(args, "--topic")?),
            "--level" => {
                let value = require_value(args, "--level")?;
                level = match value.to_lowercase().as_str() {
                    "beginner" => StudentLevel::Beginner,
                    "intermediate" => StudentLevel::Intermediate,
                    "advanced" => StudentLevel::Advanced,
                    _ => return Err(ArgsError::InvalidLevel { raw: value }),
                };
            }
            "--profile" => profile = require_value(args, "--profile")?,
            "--objective" => objective = require_value(args, "--objective")?,
            "--time" => available_time = require_value(args, "--time")?,
            "--format" => format = require_value(args, "--format")?,
            "--language" => {
                let value = require_value(args, "--language")?;
                language = Language::from_code(&value.to_lowercase())
                    .ok_or(ArgsError::InvalidLanguage { raw: value })?;
            }
            "--db" => {
                let value = require_value(args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                db_url = normalize_sqlite_url(value);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    let topic = topic.ok_or(ArgsError::MissingTopic)?;
    Ok(GenerateArgs {
        common: CommonArgs { db_url },
        request: CourseRequest {
            topic,
            level,
            profile,
            objective,
            available_time,
            format,
            language,
        },
    })
}

fn parse_common(args: &mut impl Iterator<Item = String>) -> Result<CommonArgs, ArgsError> {
    let mut db_url = default_db_url();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let value = require_value(args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                db_url = normalize_sqlite_url(value);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(CommonArgs { db_url })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    argv.remove(0);

    // resume takes a positional index before the flags
    let resume_index = if cmd == Command::Resume {
        let raw = argv
            .first()
            .cloned()
            .ok_or(ArgsError::MissingValue { flag: "resume" })?;
        let index: usize = raw
            .parse()
            .map_err(|_| ArgsError::InvalidIndex { raw: raw.clone() })?;
        argv.remove(0);
        Some(index)
    } else {
        None
    };

    let mut iter = argv.into_iter();
    match cmd {
        Command::Generate => {
            let parsed = parse_generate(&mut iter).map_err(|e| {
                eprintln!("{e}");
                print_usage();
                e
            })?;
            generate(parsed).await
        }
        Command::Courses => {
            let common = parse_common(&mut iter)?;
            list_courses(common).await
        }
        Command::Resume => {
            let common = parse_common(&mut iter)?;
            let index = resume_index.unwrap_or(0);
            resume(ResumeArgs { common, index }).await
        }
    }
}

async fn open_storage(db_url: &str) -> Result<Storage, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    Ok(Storage::sqlite(db_url).await?)
}

async fn generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(&args.common.db_url).await?;
    let generator = ChatCourseGenerator::from_env();
    if !generator.enabled() {
        eprintln!("course generation needs COURSE_AI_API_KEY to be set");
        std::process::exit(2);
    }

    let mut flow = CourseFlow::new(
        Arc::new(generator),
        storage.courses.clone(),
        Clock::default_clock(),
    );

    println!("Generating course for \"{}\"…", args.request.topic);
    flow.create_course(&args.request).await?;
    let course = flow
        .active_course()
        .ok_or("generation finished without an active course")?;

    println!();
    println!("{} — {}", course.title, course.description);
    println!("Level: {} · Duration: {}", course.level, course.duration);
    for (unit_idx, unit) in course.units.iter().enumerate() {
        println!("  Unit {}: {}", unit_idx + 1, unit.title);
        for lesson in &unit.lessons {
            println!("    [{}] {}", lesson.id, lesson.title);
        }
    }
    println!(
        "  Final exam: {} questions · {} project proposals · {} sources",
        course.final_evaluation.len(),
        course.final_projects.len(),
        course.sources.len()
    );
    Ok(())
}

async fn list_courses(common: CommonArgs) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(&common.db_url).await?;
    let entries = storage.courses.load().await?;
    if entries.is_empty() {
        println!("no saved courses yet; run `generate` first");
        return Ok(());
    }

    let study = StudyService::new(storage.progress.clone());
    for (index, entry) in entries.iter().enumerate() {
        let session = study.open(&entry.course).await?;
        println!(
            "[{index}] {} ({} lessons, {}% complete, saved {})",
            entry.course.title,
            session.total_lessons(),
            session.progress_percent(),
            entry.saved_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

async fn resume(args: ResumeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(&args.common.db_url).await?;
    let entries = storage.courses.load().await?;
    let Some(entry) = entries.get(args.index) else {
        eprintln!("no saved course at index {}", args.index);
        std::process::exit(2);
    };

    let study = StudyService::new(storage.progress.clone());
    let mut session = study.open(&entry.course).await?;
    let view = study.continue_learning(&mut session).await?;

    println!(
        "{} — {}% complete",
        entry.course.title,
        session.progress_percent()
    );
    match view {
        ViewState::Lesson { unit, lesson } => {
            let next = &entry.course.units[unit].lessons[lesson];
            println!("continue with [{}] {}", next.id, next.title);
            println!("  key idea: {}", next.content.key_idea);
        }
        ViewState::FinalExam => {
            println!("all lessons complete; the final exam is next");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
