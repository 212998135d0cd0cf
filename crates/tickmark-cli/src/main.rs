use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tickmark_config::Config;
use tickmark_engine::lint::{DiagnosticsSink, LintIssue, Linter};
use tickmark_engine::todo::{MetadataEntry, MetadataObserver, MetadataObservers};
use tickmark_engine::{
    Document, TodoConfig, TodoId, TodoItem, TodoMap, TodoState, add_metadata, apply_fixes,
    create_todo, remove_metadata, remove_todo_marker, set_todo_state, to_glyphs, to_markdown,
};

/// Hierarchical todo lists inside markdown files
#[derive(Parser)]
#[command(name = "tickmark")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/tickmark/config.toml)
    #[arg(short, long, global = true, env = "TICKMARK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the todos of each file as a tree with progress
    List {
        /// Files to read; the configured `files` globs when omitted
        files: Vec<PathBuf>,

        /// Only show unchecked todos
        #[arg(long)]
        open: bool,
    },

    /// Flip the todo on a line, cascading to its children and parents
    Toggle {
        file: PathBuf,
        /// 1-based line of the todo (any of its lines)
        line: usize,

        /// Set this state instead of flipping
        #[arg(long, value_enum)]
        to: Option<StateArg>,
    },

    /// Turn a line into an unchecked todo
    New { file: PathBuf, line: usize },

    /// Drop the todo marker from a line, keeping the list item
    Unmark { file: PathBuf, line: usize },

    /// Set `@tag(value)` on a todo, replacing an existing value
    Tag {
        file: PathBuf,
        line: usize,
        tag: String,
        value: String,
    },

    /// Remove every `@tag(...)` (aliases included) from a todo
    Untag {
        file: PathBuf,
        line: usize,
        tag: String,
    },

    /// Check list indentation and marker consistency
    Lint {
        files: Vec<PathBuf>,

        /// Rewrite files with the suggested fixes
        #[arg(long)]
        fix: bool,
    },

    /// Convert between `[ ]`/`[x]` checkboxes and the configured glyphs
    Convert {
        files: Vec<PathBuf>,

        #[arg(long, value_enum)]
        to: Form,

        /// Rewrite the files instead of printing the result
        #[arg(long)]
        write: bool,
    },

    /// Write a config file holding the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StateArg {
    Checked,
    Unchecked,
}

impl From<StateArg> for TodoState {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Checked => TodoState::Checked,
            StateArg::Unchecked => TodoState::Unchecked,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Form {
    Glyphs,
    Markdown,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.unwrap_or_else(Config::config_path);

    match cli.command {
        Commands::Init { force } => init(&config_path, force),
        command => {
            let config = Config::load_from_path(&config_path)?.unwrap_or_default();
            log::debug!("using config from {}", config_path.display());
            execute(command, &config, &config_path)
        }
    }
}

fn execute(command: Commands, config: &Config, config_path: &Path) -> Result<ExitCode> {
    match command {
        Commands::List { files, open } => {
            for file in input_files(config, files)? {
                let doc = read_document(&file)?;
                let map = doc.discover(&config.todo);
                println!("{}", file.display());
                for line in render_list(&map, &config.todo, open) {
                    println!("{line}");
                }
            }
        }
        Commands::Toggle { file, line, to } => {
            let mut doc = read_document(&file)?;
            let map = doc.discover(&config.todo);
            let id = todo_at(&map, line)?;
            let state = match to {
                Some(state) => state.into(),
                None => map.get(id).map(|i| i.state.toggled()).unwrap_or(TodoState::Checked),
            };
            let changes = set_todo_state(&mut doc, &map, &config.todo, id, state)?;
            if changes.is_empty() {
                println!("line {line} is already {state}");
                return Ok(ExitCode::SUCCESS);
            }
            for change in &changes {
                println!("line {}: {} -> {}", change.id.row() + 1, change.from, change.to);
            }
            write_document(&file, &doc)?;
        }
        Commands::New { file, line } => {
            let mut doc = read_document(&file)?;
            if create_todo(&mut doc, row_of(line)?, &config.todo)? {
                write_document(&file, &doc)?;
            } else {
                println!("line {line} is already a todo");
            }
        }
        Commands::Unmark { file, line } => {
            let mut doc = read_document(&file)?;
            let map = doc.discover(&config.todo);
            let id = todo_at(&map, line)?;
            remove_todo_marker(&mut doc, &map, id)?;
            write_document(&file, &doc)?;
        }
        Commands::Tag {
            file,
            line,
            tag,
            value,
        } => {
            let mut doc = read_document(&file)?;
            let map = doc.discover(&config.todo);
            let id = todo_at(&map, line)?;
            add_metadata(
                &mut doc,
                &map,
                &config.todo,
                id,
                &tag,
                &value,
                &announcer(),
            )?;
            write_document(&file, &doc)?;
        }
        Commands::Untag { file, line, tag } => {
            let mut doc = read_document(&file)?;
            let map = doc.discover(&config.todo);
            let id = todo_at(&map, line)?;
            let removed = remove_metadata(
                &mut doc,
                &map,
                &config.todo,
                id,
                &tag,
                &announcer(),
            )?;
            if removed.is_empty() {
                println!("no @{tag} on line {line}");
            } else {
                write_document(&file, &doc)?;
            }
        }
        Commands::Lint { files, fix } => {
            let mut found = 0;
            for file in input_files(config, files)? {
                found += lint_file(&file, &config.todo, fix)?;
            }
            if found > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Convert { files, to, write } => {
            for file in input_files(config, files)? {
                let text = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let converted = match to {
                    Form::Glyphs => to_glyphs(&text, &config.todo.markers),
                    Form::Markdown => to_markdown(&text, &config.todo.markers),
                };
                if write {
                    if converted != text {
                        std::fs::write(&file, converted)
                            .with_context(|| format!("Failed to write {}", file.display()))?;
                        println!("converted {}", file.display());
                    }
                } else {
                    print!("{converted}");
                }
            }
        }
        Commands::Init { force } => return init(config_path, force),
    }

    Ok(ExitCode::SUCCESS)
}

fn init(config_path: &Path, force: bool) -> Result<ExitCode> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            config_path.display()
        );
    }
    Config::default().save_to_path(config_path)?;
    println!("wrote {}", config_path.display());
    Ok(ExitCode::SUCCESS)
}

fn input_files(config: &Config, files: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if !files.is_empty() {
        return Ok(files);
    }
    let files = config.resolve_files()?;
    if files.is_empty() {
        bail!("no files given and no configured `files` pattern matched anything");
    }
    Ok(files)
}

fn read_document(path: &Path) -> Result<Document> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Document::from_bytes(&bytes).with_context(|| format!("Failed to load {}", path.display()))
}

fn write_document(path: &Path, doc: &Document) -> Result<()> {
    std::fs::write(path, doc.to_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn row_of(line: usize) -> Result<usize> {
    match line.checked_sub(1) {
        Some(row) => Ok(row),
        None => bail!("line numbers start at 1"),
    }
}

/// The innermost todo covering a 1-based line.
fn todo_at(map: &TodoMap, line: usize) -> Result<TodoId> {
    let row = row_of(line)?;
    map.item_at_row(row)
        .map(|item| item.id)
        .with_context(|| format!("no todo on line {line}"))
}

/// Lints one file, printing what is left after the optional fix pass.
/// Returns the number of remaining issues.
fn lint_file(path: &Path, config: &TodoConfig, fix: bool) -> Result<usize> {
    let mut doc = read_document(path)?;
    let linter = Linter::new(config.linter.clone());

    if fix {
        let issues = doc.lint(config);
        let fixed = apply_fixes(&mut doc, &issues)?;
        if fixed > 0 {
            write_document(path, &doc)?;
            println!("{}: fixed {fixed} issues", path.display());
        }
    }

    let lines = doc.lines();
    let mut sink = PrintSink { path };
    Ok(linter.publish(&doc.outline(), &lines, &mut sink))
}

/// Prints diagnostics as `file:line:column: severity CODE message`.
struct PrintSink<'a> {
    path: &'a Path,
}

impl DiagnosticsSink for PrintSink<'_> {
    fn publish(&mut self, _namespace: &str, issues: &[LintIssue]) {
        for issue in issues {
            println!("{}", format_issue(self.path, issue));
        }
    }
}

fn format_issue(path: &Path, issue: &LintIssue) -> String {
    format!(
        "{}:{}:{}: {} {} {}",
        path.display(),
        issue.range.start.row + 1,
        issue.range.start.column + 1,
        issue.severity,
        issue.code,
        issue.message
    )
}

/// Reports tag edits on stdout.
struct Announce;

impl MetadataObserver for Announce {
    fn on_add(&self, item: &TodoItem, entry: &MetadataEntry) {
        println!("+ @{}({}) on \"{}\"", entry.tag, entry.value, item.text);
    }

    fn on_remove(&self, item: &TodoItem, entry: &MetadataEntry) {
        println!("- @{}({}) on \"{}\"", entry.tag, entry.value, item.text);
    }
}

fn announcer() -> MetadataObservers {
    let mut observers = MetadataObservers::new();
    observers.register(Announce);
    observers
}

fn depth(map: &TodoMap, item: &TodoItem) -> usize {
    let mut depth = 0;
    let mut parent = item.parent;
    while let Some(id) = parent {
        depth += 1;
        parent = map.get(id).and_then(|p| p.parent);
    }
    depth
}

/// One line per todo: line number, nesting, glyph, text and the progress
/// of parents.
fn render_list(map: &TodoMap, config: &TodoConfig, open_only: bool) -> Vec<String> {
    map.iter()
        .filter(|item| !(open_only && item.is_checked()))
        .map(|item| {
            let mut line = format!(
                "{:>5}  {}{} {}",
                item.row() + 1,
                "  ".repeat(depth(map, item)),
                config.markers.for_state(item.state),
                item.text
            );
            if !item.children.is_empty() {
                line.push_str(&format!(" [{}]", item.progress(map)));
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn discover(text: &str) -> TodoMap {
        Document::from_text(text).discover(&TodoConfig::default())
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_toggle_with_explicit_state() {
        let cli = Cli::try_parse_from(["tickmark", "toggle", "notes.md", "3", "--to", "checked"])
            .unwrap();
        match cli.command {
            Commands::Toggle { file, line, to } => {
                assert_eq!(file, PathBuf::from("notes.md"));
                assert_eq!(line, 3);
                assert!(matches!(to, Some(StateArg::Checked)));
            }
            _ => panic!("expected toggle"),
        }
    }

    #[test]
    fn list_renders_nesting_and_progress() {
        let map = discover("- [ ] Ship @p(high)\n  - [x] Build\n  - [ ] Tag\n- plain\n");
        let lines = render_list(&map, &TodoConfig::default(), false);
        assert_eq!(
            lines,
            vec![
                "    1  □ Ship @p(high) [1/2]",
                "    2    ✔ Build",
                "    3    □ Tag",
            ]
        );
    }

    #[test]
    fn list_can_hide_checked_items() {
        let map = discover("- [ ] a\n- [x] b\n");
        let lines = render_list(&map, &TodoConfig::default(), true);
        assert_eq!(lines, vec!["    1  □ a"]);
    }

    #[test]
    fn lines_are_one_based() {
        let map = discover("# Plan\n- [ ] a\n  continued\n");
        assert_eq!(todo_at(&map, 3).unwrap().row(), 1);
        assert!(todo_at(&map, 1).is_err());
        assert!(todo_at(&map, 0).is_err());
    }

    #[test]
    fn issues_print_with_file_positions() {
        let doc = Document::from_text("- Parent\n - Bad child\n");
        let issues = doc.lint(&TodoConfig::default());
        assert_eq!(
            format_issue(Path::new("plan.md"), &issues[0]),
            "plan.md:2:2: warning INDENT_SHALLOW List marker is left of the parent item's \
             content: marker at column 2, parent content at column 3"
        );
    }
}
