// ghdash command-line entry point.
// Thin text front end over the library for profiles, repositories, activity, and streaks.

use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};

use ghdash::contributions::{self, YearView};
use ghdash::github::{Contents, GitHubApi, GitHubClient, Repository};
use ghdash::insights::{self, RepoFilter, RepoSort};
use ghdash::{Config, Result};

#[derive(Parser, Debug)]
#[command(name = "ghdash")]
#[command(about = "Browse public GitHub profiles, repositories, and contribution streaks")]
#[command(version)]
struct Args {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Override the API base URL (default: $GHDASH_API_BASE_URL or https://api.github.com)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Override the cache TTL in seconds
    #[arg(long, global = true)]
    ttl: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a user profile with star and fork totals
    User { login: String },

    /// Show the most recent public events
    Activity {
        login: String,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Show the contribution calendar summary and streaks
    Contributions {
        login: String,
        /// current, previous, or both
        #[arg(long, default_value = "current")]
        year: YearView,
        /// Print the full summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a user's repositories
    Repos {
        login: String,
        /// stars, updated, or name
        #[arg(long, default_value = "stars")]
        sort: RepoSort,
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long)]
        no_forks: bool,
        #[arg(long)]
        no_archived: bool,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// Show the language breakdown of a repository
    Languages { owner: String, repo: String },

    /// Show recent issues and pull requests of a repository
    Issues {
        owner: String,
        repo: String,
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },

    /// Weekly commit totals for a repository
    Commits {
        owner: String,
        repo: String,
        #[arg(long, default_value_t = 12)]
        weeks: usize,
    },

    /// List a directory or print a file
    Contents {
        owner: String,
        repo: String,
        #[arg(default_value = "")]
        path: String,
    },

    /// Followers, following, and organizations
    Social {
        login: String,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Search users or repositories
    Search {
        #[arg(value_enum)]
        kind: SearchKind,
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SearchKind {
    Users,
    Repos,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = ghdash::logging::init(args.verbose) {
        eprintln!("warning: {}", err);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(api_base) = args.api_base {
        config.api_base_url = api_base;
    }
    if let Some(ttl) = args.ttl {
        config.cache_ttl_secs = ttl;
    }
    let config = config.validate()?;

    let api = ghdash::connect(&config)?;

    match args.command {
        Command::User { login } => show_user(&api, &login).await,
        Command::Activity { login, limit } => show_activity(&api, &login, limit).await,
        Command::Contributions { login, year, json } => {
            show_contributions(&api, &login, year, json).await
        }
        Command::Repos {
            login,
            sort,
            language,
            query,
            no_forks,
            no_archived,
            limit,
        } => {
            let filter = RepoFilter {
                query,
                language,
                include_forks: !no_forks,
                include_archived: !no_archived,
            };
            show_repos(&api, &login, &filter, sort, limit).await
        }
        Command::Languages { owner, repo } => show_languages(&api, &owner, &repo).await,
        Command::Issues { owner, repo, limit } => show_issues(&api, &owner, &repo, limit).await,
        Command::Commits { owner, repo, weeks } => show_commits(&api, &owner, &repo, weeks).await,
        Command::Contents { owner, repo, path } => show_contents(&api, &owner, &repo, &path).await,
        Command::Social { login, limit } => show_social(&api, &login, limit).await,
        Command::Search { kind, query, limit } => show_search(&api, kind, &query, limit).await,
    }
}

type Api = GitHubApi<GitHubClient>;

async fn show_user(api: &Api, login: &str) -> Result<()> {
    let Some(user) = api.user(login).await? else {
        println!("User '{}' not found", login);
        return Ok(());
    };
    let repos = api.user_repos(login, 100).await?;
    let totals = insights::totals(&repos);

    println!("{} ({})", user.name.as_deref().unwrap_or(&user.login), user.login);
    if let Some(bio) = &user.bio {
        println!("{}", bio);
    }
    for (label, value) in [
        ("Company", &user.company),
        ("Location", &user.location),
        ("Blog", &user.blog),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            println!("{:<10} {}", label, value);
        }
    }
    if let Some(created) = user.created_at {
        println!("{:<10} {}", "Joined", created.format("%B %-d, %Y"));
    }
    println!(
        "{} repos · {} followers · {} following · {} stars · {} forks",
        user.public_repos, user.followers, user.following, totals.stars, totals.forks
    );

    if repos.is_empty() {
        return Ok(());
    }
    println!();
    println!(
        "Top by stars: {}",
        ranked(insights::top_by_stars(&repos, 5), |r| r.stargazers_count)
    );
    println!(
        "Top by forks: {}",
        ranked(insights::top_by_forks(&repos, 5), |r| r.forks_count)
    );
    let languages = insights::repo_language_counts(&repos, 8)
        .into_iter()
        .map(|(language, count)| format!("{} ({})", language, count))
        .collect::<Vec<_>>();
    if !languages.is_empty() {
        println!("Languages:    {}", languages.join(", "));
    }
    Ok(())
}

fn ranked(top: Vec<&Repository>, count: fn(&Repository) -> u64) -> String {
    top.iter()
        .map(|r| format!("{} ({})", r.name, count(r)))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn show_activity(api: &Api, login: &str, limit: u32) -> Result<()> {
    let events = api.recent_events(login, limit).await?;
    if events.is_empty() {
        println!("No recent activity found");
        return Ok(());
    }

    let now = Utc::now();
    for event in &events {
        let description = insights::describe_event(event);
        println!("[{}] {}", description.badge, description.title);
        println!(
            "    in {} · {}",
            description.repo,
            insights::relative_time(now, event.created_at)
        );
    }
    Ok(())
}

async fn show_contributions(api: &Api, login: &str, year: YearView, json: bool) -> Result<()> {
    let report = contributions::fetch_contributions(api, login, Utc::now()).await?;
    let summary = report.view(year);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.is_empty() {
        println!("No contribution data available for {} ({} year)", login, year);
        return Ok(());
    }

    println!("{} contributions ({} year)", summary.total_contributions, year);
    println!("Current streak: {} days", summary.current_streak);
    println!("Longest streak: {} days", summary.longest_streak);
    println!();

    const SHADES: [char; 5] = ['·', '░', '▒', '▓', '█'];
    for weekday in 0..7 {
        let row: String = summary
            .weeks
            .iter()
            .map(|week| {
                week.iter()
                    .find(|day| {
                        chrono::Datelike::weekday(&day.date).num_days_from_sunday() == weekday
                    })
                    .map(|day| SHADES[usize::from(day.level.min(4))])
                    .unwrap_or(' ')
            })
            .collect();
        println!("{}", row);
    }
    Ok(())
}

async fn show_repos(
    api: &Api,
    login: &str,
    filter: &RepoFilter,
    sort: RepoSort,
    limit: u32,
) -> Result<()> {
    let repos = api.user_repos(login, limit).await?;
    let selected = insights::filter_and_sort(&repos, filter, sort);

    if selected.is_empty() {
        let languages = insights::distinct_languages(&repos);
        if languages.is_empty() {
            println!("No repositories match");
        } else {
            println!("No repositories match (languages: {})", languages.join(", "));
        }
        return Ok(());
    }

    for repo in selected {
        println!(
            "{:<40} ★{:<6} ⑂{:<5} {:<12} {}",
            repo.full_name,
            repo.stargazers_count,
            repo.forks_count,
            repo.language.as_deref().unwrap_or("-"),
            repo.updated_at.format("%Y-%m-%d"),
        );
    }
    Ok(())
}

async fn show_languages(api: &Api, owner: &str, repo: &str) -> Result<()> {
    let languages = api.repo_languages(owner, repo).await?;
    let shares = insights::language_breakdown(&languages);

    if shares.is_empty() {
        println!("No language data available for this repository");
        return Ok(());
    }
    for share in shares {
        println!(
            "{:<20} {:>3}%  {}",
            share.name,
            share.percentage,
            insights::format_bytes(share.bytes)
        );
    }
    Ok(())
}

async fn show_issues(api: &Api, owner: &str, repo: &str, limit: u32) -> Result<()> {
    let (issues, pulls) = tokio::try_join!(
        api.repo_issues(owner, repo, limit),
        api.repo_pulls(owner, repo, limit),
    )?;

    let issue_tally = insights::tally_issues(&issues);
    println!(
        "Issues: {} open, {} closed",
        issue_tally.open, issue_tally.closed
    );
    for issue in &issues {
        println!("  #{:<6} {:?} {}", issue.number, issue.state, issue.title);
    }

    let pull_tally = insights::tally_pulls(&pulls);
    println!(
        "Pull requests: {} open, {} merged, {} closed",
        pull_tally.open, pull_tally.merged, pull_tally.closed
    );
    for pull in &pulls {
        let state = if pull.is_merged() {
            "Merged".to_string()
        } else {
            format!("{:?}", pull.state)
        };
        println!("  #{:<6} {} {}", pull.number, state, pull.title);
    }
    Ok(())
}

async fn show_commits(api: &Api, owner: &str, repo: &str, weeks: usize) -> Result<()> {
    let series = api.commit_activity(owner, repo).await?;
    let recent = insights::recent_commit_activity(&series, weeks);

    if recent.is_empty() {
        println!("No commit activity available yet (GitHub may still be computing it)");
        return Ok(());
    }
    for week in recent {
        println!("{}  {}", week.week_start.format("%b %-d"), week.commits);
    }
    Ok(())
}

async fn show_contents(api: &Api, owner: &str, repo: &str, path: &str) -> Result<()> {
    let crumbs = insights::breadcrumbs(path);
    if !crumbs.is_empty() {
        println!("{}/{}", repo, crumbs.join("/"));
    }

    match api.repo_contents(owner, repo, path).await? {
        Contents::Directory(mut items) => {
            insights::sort_listing(&mut items);
            for item in items {
                let marker = if item.kind == ghdash::github::ContentKind::Dir {
                    "/"
                } else {
                    ""
                };
                println!("{}{}", item.name, marker);
            }
        }
        Contents::File(file) => match insights::decode_file(&file)? {
            Some(text) => print!("{}", text),
            None => println!(
                "{} is not available inline; download it from {}",
                file.name,
                file.download_url.as_deref().unwrap_or("GitHub")
            ),
        },
    }
    Ok(())
}

async fn show_social(api: &Api, login: &str, limit: u32) -> Result<()> {
    let (followers, following, orgs) = tokio::try_join!(
        api.followers(login, limit),
        api.following(login, limit),
        api.user_orgs(login),
    )?;

    let logins = |users: &[ghdash::github::UserSummary]| {
        users
            .iter()
            .map(|u| u.login.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("Followers: {}", logins(&followers));
    println!("Following: {}", logins(&following));
    println!(
        "Organizations: {}",
        orgs.iter()
            .map(|o| o.login.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

async fn show_search(api: &Api, kind: SearchKind, query: &str, limit: u32) -> Result<()> {
    match kind {
        SearchKind::Users => {
            let results = api.search_users(query, limit).await?;
            println!("{} users", results.total_count);
            for user in results.items {
                println!("  {}", user.login);
            }
        }
        SearchKind::Repos => {
            let results = api.search_repositories(query, limit).await?;
            println!("{} repositories", results.total_count);
            for repo in results.items {
                println!(
                    "  {:<40} ★{}  {}",
                    repo.full_name,
                    repo.stargazers_count,
                    repo.description.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}
