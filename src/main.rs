use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use log::info;
use rpscrape::{
    config::Config,
    courses::{format_course, format_region, CourseTable},
    schema::RaceCode,
    scrape,
};

#[derive(Parser)]
#[command(about = "Scrapes race results into CSV")]
struct Opts {
    #[arg(long, default_value = "rpscrape.toml")]
    config: PathBuf,
    #[command(subcommand)]
    sub: Sub,
}

#[derive(Subcommand)]
enum Sub {
    /// List region codes, or search them by name.
    Regions { search: Option<String> },
    /// List all courses, the courses of a region, or search them by name.
    Courses { search: Option<String> },
    /// Scrape results for a region or course.
    Scrape(ScrapeArgs),
}

#[derive(Args)]
struct ScrapeArgs {
    /// Region code (e.g. `ire`) or course code (e.g. `533`).
    target: String,
    /// A year or an inclusive range such as `2015-2018`.
    years: String,
    #[arg(value_enum)]
    code: RaceCode,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let opts = Opts::parse();
    let config = Config::load(&opts.config)?;
    let table = CourseTable::new(&config.courses_dir);

    match opts.sub {
        Sub::Regions { search: None } => {
            for (code, region) in table.regions()? {
                println!("{}", format_region(&code, &region));
            }
        }
        Sub::Regions {
            search: Some(search),
        } => {
            for (code, region) in table.search_regions(&search)? {
                println!("{}", format_region(&code, &region));
            }
        }
        Sub::Courses { search } => {
            let courses = match search.map(|s| s.to_lowercase()) {
                None => table.all_courses()?,
                Some(region) if table.is_region(&region)? => table.courses(&region)?,
                Some(search) => table.search_courses(&search)?,
            };
            for course in &courses {
                println!("{}", format_course(course));
            }
        }
        Sub::Scrape(args) => scrape_command(&config, &table, args).await?,
    }
    Ok(())
}

async fn scrape_command(
    config: &Config,
    table: &CourseTable,
    args: ScrapeArgs,
) -> anyhow::Result<()> {
    let target = args.target.to_lowercase();
    let (tracks, target_name) = if table.is_region(&target)? {
        let tracks = table
            .courses(&target)?
            .iter()
            .map(|course| (course.code().clone(), course.url_name()))
            .collect_vec();
        (tracks, target.clone())
    } else if let Some(course) = table.find_course(&target)? {
        let name = course.url_name();
        (vec![(course.code().clone(), name.clone())], name.to_string())
    } else {
        println!("Invalid course or region.");
        return Ok(());
    };

    let years = match config.parse_years(&args.years) {
        Ok(years) => years,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };
    info!("{} tracks, years {years:?}", tracks.len());

    println!(
        "Scraping {} results from {target_name} in {}...",
        args.code, args.years
    );
    let (path, summary) = scrape::run(
        config,
        &tracks,
        &years,
        args.code,
        &target_name,
        &args.years,
    )
    .await?;
    info!("{summary:?}");
    println!(
        "\nFinished scraping. {} saved in {}",
        path.file_name().unwrap_or_default().to_string_lossy(),
        config.data_dir.display()
    );
    Ok(())
}
