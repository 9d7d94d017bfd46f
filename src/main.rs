use clap::{Args, CommandFactory, Parser, Subcommand};
use reqwest::Url;
use sodabar::base::{self, BaseSource};
use sodabar::cache::{CacheError, HttpFetcher, Offline, OfflineCache};
use sodabar::catalog::Catalog;
use sodabar::config::Config;
use sodabar::form::{Field, FormController, FormError};
use sodabar::kv::FileStore;
use sodabar::share::{self, DirectoryShare, ShareTarget};
use sodabar::telemetry;
use sodabar::theme::{self, Theme};
use sodabar::update::{self, UpdateControl};
use sodabar::view::{self, ALL_ACTIONS};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(name = "sodabar", about = "Soda Bar: soda recipes with local edits")]
struct Cli {
    /// Directory for local edits, custom recipes and the offline cache
    #[arg(long, global = true, env = "SODABAR_DIR")]
    data_dir: Option<PathBuf>,
    /// Base dataset: a JSON file, an http(s) URL, or "embedded"
    #[arg(long, global = true, env = "SODABAR_BASE")]
    base: Option<BaseSource>,
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Args, Default)]
struct RecipeFields {
    #[arg(short, long)]
    name: Option<String>,
    /// Comma-separated tags
    #[arg(short, long)]
    tags: Option<String>,
    /// Ingredient line (repeatable)
    #[arg(short, long = "ingredient")]
    ingredients: Vec<String>,
    /// Method step (repeatable)
    #[arg(short = 's', long = "step")]
    steps: Vec<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Comma-separated extras for the adult variant
    #[arg(long)]
    spiced: Option<String>,
}

#[derive(Subcommand)]
enum Cmd {
    /// List recipes, optionally filtered
    List {
        /// Case-insensitive search over name, notes and ingredients
        #[arg(short, long, default_value = "")]
        query: String,
        /// Include adult variants
        #[arg(long)]
        adult: bool,
    },
    /// Show one recipe
    Show {
        id: String,
        #[arg(long)]
        adult: bool,
    },
    /// Save a custom recipe
    Create {
        #[command(flatten)]
        fields: RecipeFields,
    },
    /// Edit a recipe; built-in recipes keep a local edit
    Edit {
        id: String,
        #[command(flatten)]
        fields: RecipeFields,
    },
    /// Delete a recipe (built-in recipes come back with `update`)
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Export a recipe card
    Share {
        id: String,
        /// Directory to write the card into
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        adult: bool,
    },
    /// Show or set the color theme
    Theme { theme: Option<Theme> },
    /// Restore built-in recipes and clear the offline cache
    Update,
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
}

fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = Config::new(cli.data_dir, cli.base, cli.verbose);
    match cli.command {
        Cmd::List { query, adult } => {
            let mut catalog = open(&config)?;
            catalog.query = query;
            catalog.show_adult = adult;
            print!("{}", catalog.grid(&[]));
            Ok(())
        }
        Cmd::Show { id, adult } => {
            let catalog = open(&config)?;
            let record = catalog.resolve(&id).map_err(|e| e.to_string())?;
            print!("{}", view::render_card(record, adult, ALL_ACTIONS));
            Ok(())
        }
        Cmd::Create { fields } => {
            let mut catalog = open(&config)?;
            let mut form = FormController::new();
            form.open_create();
            apply_fields(&mut form, fields);
            let id = submit(&mut form, &mut catalog)?;
            println!("created {id}");
            Ok(())
        }
        Cmd::Edit { id, fields } => {
            let mut catalog = open(&config)?;
            let mut form = FormController::new();
            form.open_edit(catalog.resolve(&id).map_err(|e| e.to_string())?);
            apply_fields(&mut form, fields);
            let id = submit(&mut form, &mut catalog)?;
            println!("updated {id}");
            Ok(())
        }
        Cmd::Delete { id, yes } => {
            let mut catalog = open(&config)?;
            let id = catalog.resolve(&id).map_err(|e| e.to_string())?.id.clone();
            let deleted = catalog
                .delete(&id, |prompt| yes || confirm(prompt))
                .map_err(|e| e.to_string())?;
            if deleted {
                println!("deleted {id}");
            } else {
                println!("cancelled");
            }
            Ok(())
        }
        Cmd::Share { id, out, adult } => {
            let catalog = open(&config)?;
            let record = catalog.resolve(&id).map_err(|e| e.to_string())?;
            let target = out.map(DirectoryShare::new);
            share::share_record(record, adult, target.as_ref().map(|t| t as &dyn ShareTarget))
                .map_err(|e| e.to_string())?;
            if let Some(target) = &target {
                let payload = share::payload(record, adult);
                println!("shared {}", target.path_for(&payload).display());
            }
            Ok(())
        }
        Cmd::Theme { theme } => {
            let mut storage = config.storage();
            match theme {
                Some(t) => {
                    let color = theme::set_theme(&mut storage, t);
                    println!("theme set to {t} ({color})");
                }
                None => println!("{}", theme::load_theme(&storage)),
            }
            Ok(())
        }
        Cmd::Update => {
            let mut catalog = open(&config)?;
            let cache = config.cache();
            let mut control = UpdateControl::default();
            control
                .trigger(|| update::update_app(catalog.storage_mut(), &cache))
                .map_err(|e| e.to_string())?;
            if let BaseSource::Url(url) = &config.base {
                precache(&cache, url);
            }
            catalog.reload();
            println!(
                "restored built-in recipes; {} recipes available",
                catalog.records().len()
            );
            Ok(())
        }
        Cmd::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "sodabar", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn open(config: &Config) -> Result<Catalog<FileStore>, String> {
    let cache = config.cache();
    let records = match &config.base {
        BaseSource::Url(_) => {
            let fetcher = HttpFetcher::new().map_err(|e| e.to_string())?;
            base::load(&config.base, &cache, &fetcher)
        }
        _ => base::load(&config.base, &cache, &Offline),
    }
    .map_err(|e| e.to_string())?;
    Ok(Catalog::open(config.storage(), records))
}

/// Fill the fresh cache generation with the remote dataset. Failure only
/// means the next run fetches it instead.
fn precache(cache: &OfflineCache, url: &Url) {
    let result = HttpFetcher::new()
        .map_err(CacheError::from)
        .and_then(|fetcher| cache.install(std::slice::from_ref(url), &fetcher));
    if let Err(e) = result {
        warn!(%url, error = %e, "unable to precache base dataset");
    }
}

fn apply_fields(form: &mut FormController, args: RecipeFields) {
    if let Some(name) = args.name {
        form.fields.name = name;
    }
    if let Some(tags) = args.tags {
        form.fields.tags = tags;
    }
    if !args.ingredients.is_empty() {
        form.fields.ingredients.populate(&args.ingredients);
    }
    if !args.steps.is_empty() {
        form.fields.method.populate(&args.steps);
    }
    if let Some(notes) = args.notes {
        form.fields.notes = notes;
    }
    if let Some(spiced) = args.spiced {
        form.fields.spiced = spiced;
    }
}

fn submit(form: &mut FormController, catalog: &mut Catalog<FileStore>) -> Result<String, String> {
    form.submit(catalog).map_err(|e| match e {
        FormError::Validation(v) => format!("{v} (use --{})", flag_for(v.field())),
        other => other.to_string(),
    })
}

fn flag_for(field: Field) -> &'static str {
    match field {
        Field::Name => "name",
        Field::Tags => "tags",
        Field::Ingredients => "ingredient",
        Field::Method => "step",
        Field::Notes => "notes",
        Field::Spiced => "spiced",
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn apply_fields_only_overrides_given_values() {
        let mut form = FormController::new();
        form.open_create();
        form.fields.notes = "keep me".to_string();
        apply_fields(
            &mut form,
            RecipeFields {
                name: Some("Fizz".to_string()),
                ingredients: vec!["soda".to_string(), "lime".to_string()],
                ..RecipeFields::default()
            },
        );
        assert_eq!(form.fields.name, "Fizz");
        assert_eq!(form.fields.notes, "keep me");
        assert_eq!(form.fields.ingredients.values(), vec!["soda", "lime"]);
        assert_eq!(form.fields.method.values(), Vec::<String>::new());
    }

    #[test]
    fn validation_points_at_flag() {
        assert_eq!(flag_for(Field::Ingredients), "ingredient");
        assert_eq!(flag_for(Field::Method), "step");
    }
}
