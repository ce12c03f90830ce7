// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod page;

use anyhow::{Context, Result, anyhow, bail};
use budgetsheet_app::{BudgetSheetEditor, SheetKey, locate_sheet};
use budgetsheet_store::Store;
use config::Config;
use std::env;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `budgetsheet --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    if options.list_slots {
        let store = open_store(&options, &db_path)?;
        store.bootstrap()?;
        for slot in store.list_slots()? {
            let updated_at = slot
                .updated_at
                .format(&Rfc3339)
                .with_context(|| format!("format updated_at for slot {}", slot.key))?;
            println!("{}\t{}\t{}", slot.key, slot.bytes, updated_at);
        }
        return Ok(());
    }

    let page = match (&options.page_path, options.demo) {
        (_, true) => budgetsheet_testkit::demo_page(),
        (Some(path), false) => page::load_page(path)?,
        (None, false) => bail!("no page to edit; pass --page <file> or --demo"),
    };
    if options.print_key {
        println!("{}", SheetKey::from_path(&page.path));
        return Ok(());
    }

    logging::init(&config.log_path()?, &config.log_level())?;

    let mut store = open_store(&options, &db_path)?;
    store.bootstrap()?;
    store.set_quota_bytes(config.quota_bytes())?;

    let markers = config.markers();
    let location = locate_sheet(&page, &markers)?;
    let mut editor = BudgetSheetEditor::init(page, location, markers, store)?;
    info!(
        db = %db_path.display(),
        read_only = options.read_only,
        demo = options.demo,
        "startup complete"
    );
    if options.check_only {
        return Ok(());
    }

    budgetsheet_tui::run_app(&mut editor)
}

fn open_store(options: &CliOptions, db_path: &Path) -> Result<Store> {
    if options.demo {
        return Store::open_memory();
    }
    if options.read_only {
        return Store::open_read_only(db_path).with_context(|| {
            format!(
                "open database {} read-only -- the file must already exist",
                db_path.display()
            )
        });
    }
    Store::open(db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or BUDGETSHEET_DB_PATH",
            db_path.display()
        )
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    page_path: Option<PathBuf>,
    print_config_path: bool,
    print_db_path: bool,
    print_key: bool,
    list_slots: bool,
    demo: bool,
    read_only: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        page_path: None,
        print_config_path: false,
        print_db_path: false,
        print_key: false,
        list_slots: false,
        demo: false,
        read_only: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--page" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--page requires a page JSON file"))?;
                options.page_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-key" => {
                options.print_key = true;
            }
            "--list-slots" => {
                options.list_slots = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--read-only" => {
                options.read_only = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.demo && options.page_path.is_some() {
        bail!("--demo and --page are mutually exclusive");
    }
    if options.demo && options.read_only {
        bail!("--demo and --read-only are mutually exclusive; demo storage is in memory");
    }

    Ok(options)
}

fn print_help() {
    println!("budgetsheet");
    println!("  --page <path>            Edit the budget sheet in a page JSON file");
    println!("  --demo                   Edit a seeded demo sheet (in-memory storage)");
    println!("  --read-only              Open storage without write access");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-key              Print the storage key for the page");
    println!("  --list-slots             List saved sheets with size and last save time");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config, storage, and page, then exit");
    println!("  --help                   Show this help");
}
