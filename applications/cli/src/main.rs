/// Earshot - social audio from the terminal
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use earshot_cli::{EarshotConfig, HeadlessEngine, ReplayFeed};
use earshot_client::EarshotClient;
use earshot_core::{AuthEvent, Post, PostId};
use earshot_feed::{FeedManager, ProfileShelves, SessionSupervisor, Shelf, ToggleOutcome};
use earshot_playback::TrackPlayer;
use earshot_studio::{
    CategorySelector, PostRemover, ProfileEditor, ProfileUpdate, UploadPipeline, UploadRequest,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "earshot")]
#[command(about = "Earshot social audio client", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./earshot.toml)
    #[arg(short, long, global = true, env = "EARSHOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the feed, newest first
    Feed {
        /// Only posts in this category (id or slug)
        #[arg(short, long)]
        category: Option<String>,
        /// Print posts as JSON
        #[arg(long)]
        json: bool,
    },
    /// List your own posts, likes or saves
    Shelf {
        #[arg(value_enum, default_value = "posts")]
        shelf: ShelfArg,
    },
    /// Like or unlike a post
    Like { post_id: String },
    /// Save or unsave a post
    Save { post_id: String },
    /// List categories
    Categories,
    /// Upload a clip and post it
    Publish {
        /// Audio file (m4a, mp3, wav or caf)
        file: PathBuf,
        /// Post title
        #[arg(short, long)]
        title: String,
        /// Clip length in whole seconds
        #[arg(short, long)]
        duration: u32,
        /// Category id or slug; repeat for several (default: general)
        #[arg(short = 'C', long = "category")]
        categories: Vec<String>,
    },
    /// Delete one of your posts and its clip
    Delete { post_id: String },
    /// Show the signed-in user
    Whoami,
    /// Show or update your profile
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },
    /// Load the feed and follow realtime changes as they arrive
    Watch {
        /// Replay recorded frames from a file (`-` for stdin) instead of
        /// following the backend live
        #[arg(short, long)]
        frames: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ShelfArg {
    Posts,
    Likes,
    Saved,
}

impl From<ShelfArg> for Shelf {
    fn from(arg: ShelfArg) -> Self {
        match arg {
            ShelfArg::Posts => Shelf::Posts,
            ShelfArg::Likes => Shelf::Likes,
            ShelfArg::Saved => Shelf::Saved,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "earshot=info,earshot_feed=info,earshot_studio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = EarshotConfig::load(cli.config.as_deref())?;
    config.validate()?;
    let app = App::connect(config).await?;

    match cli.command {
        Commands::Feed { category, json } => show_feed(&app, category.as_deref(), json).await?,
        Commands::Shelf { shelf } => show_shelf(&app, shelf.into()).await?,
        Commands::Like { post_id } => toggle(&app, &PostId::new(post_id), false).await?,
        Commands::Save { post_id } => toggle(&app, &PostId::new(post_id), true).await?,
        Commands::Categories => list_categories(&app).await?,
        Commands::Publish {
            file,
            title,
            duration,
            categories,
        } => publish(&app, file, title, duration, &categories).await?,
        Commands::Delete { post_id } => delete(&app, &PostId::new(post_id)).await?,
        Commands::Whoami => whoami(&app).await?,
        Commands::Profile {
            username,
            full_name,
            avatar_url,
            website,
        } => {
            let update = ProfileUpdate {
                username,
                full_name,
                avatar_url,
                website,
            };
            profile(&app, update).await?;
        }
        Commands::Watch { frames } => watch(&app, frames).await?,
    }

    Ok(())
}

/// Connected client plus the wiring every command shares
struct App {
    config: EarshotConfig,
    client: Arc<EarshotClient>,
    /// How the session was established
    session: AuthEvent,
}

impl App {
    async fn connect(config: EarshotConfig) -> anyhow::Result<Self> {
        let client = Arc::new(EarshotClient::new(config.backend_config())?);

        let session = match config.credentials() {
            Some((email, password)) => {
                let session = client
                    .sign_in(email, password)
                    .await
                    .context("Sign-in failed")?;
                AuthEvent::SignedIn(session.user.id)
            }
            None => client.initial_session().await,
        };
        tracing::debug!(?session, url = client.url(), "Connected");

        Ok(Self {
            config,
            client,
            session,
        })
    }

    fn feed(&self) -> Arc<FeedManager> {
        Arc::new(FeedManager::new(
            self.client.clone(),
            self.client.clone(),
            self.client.clone(),
            self.config.feed.clone(),
        ))
    }

    fn player(&self) -> Arc<TrackPlayer<HeadlessEngine>> {
        Arc::new(TrackPlayer::new(HeadlessEngine, self.config.playback.clone()))
    }

    async fn loaded_feed(&self) -> anyhow::Result<Arc<FeedManager>> {
        let feed = self.feed();
        feed.set_viewer(self.session.session_user().cloned());
        feed.load_initial().await.context("Could not load the feed")?;
        Ok(feed)
    }
}

fn print_post(post: &Post) {
    let mut marks = String::new();
    if post.is_liked {
        marks.push_str(" [liked]");
    }
    if post.is_saved {
        marks.push_str(" [saved]");
    }
    println!(
        "{}  {} by @{} ({})  likes={} comments={} listens={}{}",
        post.id,
        post.title,
        post.username,
        post.duration_label(),
        post.like_count,
        post.comment_count,
        post.listen_count,
        marks
    );
}

fn print_posts(posts: &[Post]) {
    if posts.is_empty() {
        println!("No posts.");
    }
    for post in posts {
        print_post(post);
    }
}

async fn show_feed(app: &App, category: Option<&str>, json: bool) -> anyhow::Result<()> {
    let feed = app.loaded_feed().await?;

    let posts = match category {
        Some(wanted) => {
            let mut selector = CategorySelector::new(app.client.clone());
            selector.load().await?;
            let Some(category) = selector
                .categories()
                .iter()
                .find(|c| c.id.as_str() == wanted || c.slug == wanted)
            else {
                bail!("Unknown category: {wanted}");
            };
            feed.posts_in_category(&category.id)
        }
        None => feed.posts(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
    } else {
        print_posts(&posts);
    }
    Ok(())
}

async fn show_shelf(app: &App, shelf: Shelf) -> anyhow::Result<()> {
    let editor = ProfileEditor::new(app.client.clone(), app.client.clone());
    let Some(profile) = editor.load().await? else {
        bail!("Sign in and create a profile first");
    };

    let feed = app.loaded_feed().await?;
    let shelves = ProfileShelves::from_feed(&feed.posts(), &profile.username);
    print_posts(shelves.shelf(shelf));
    Ok(())
}

async fn toggle(app: &App, post_id: &PostId, save: bool) -> anyhow::Result<()> {
    let feed = app.loaded_feed().await?;

    let outcome = if save {
        feed.toggle_save(post_id).await
    } else {
        feed.toggle_like(post_id).await
    };

    match outcome {
        ToggleOutcome::Applied(on) => {
            let verb = match (save, on) {
                (false, true) => "Liked",
                (false, false) => "Unliked",
                (true, true) => "Saved",
                (true, false) => "Unsaved",
            };
            println!("{verb} {post_id}");
            if let Some(post) = feed.post(post_id) {
                print_post(&post);
            }
        }
        ToggleOutcome::SignInRequired => bail!("Sign in to like or save posts"),
        ToggleOutcome::NotInFeed => bail!("No post with id {post_id}"),
        ToggleOutcome::Busy => bail!("Another change to {post_id} is still in flight"),
        ToggleOutcome::RolledBack => bail!("The change to {post_id} was not accepted"),
    }
    Ok(())
}

async fn list_categories(app: &App) -> anyhow::Result<()> {
    let mut selector = CategorySelector::new(app.client.clone());
    selector.load().await?;
    for category in selector.categories() {
        let default = if category.is_general() { " (default)" } else { "" };
        println!("{}  {}  {}{}", category.id, category.slug, category.name, default);
    }
    Ok(())
}

async fn publish(
    app: &App,
    file: PathBuf,
    title: String,
    duration: u32,
    wanted: &[String],
) -> anyhow::Result<()> {
    let mut selector = CategorySelector::new(app.client.clone());
    selector.load().await?;

    let mut chosen = Vec::new();
    for name in wanted {
        let Some(category) = selector
            .categories()
            .iter()
            .find(|c| c.id.as_str() == name.as_str() || &c.slug == name)
        else {
            bail!("Unknown category: {name}");
        };
        chosen.push(category.id.clone());
    }
    for id in &chosen {
        if !selector.is_selected(id) {
            selector.toggle(id);
        }
    }
    if !chosen.is_empty() {
        if let Some(general) = selector.general_id().cloned() {
            if !chosen.contains(&general) {
                selector.toggle(&general);
            }
        }
    }
    selector.ensure_selection()?;

    let pipeline = UploadPipeline::new(app.client.clone(), app.client.clone(), app.client.clone());
    let published = pipeline
        .publish(UploadRequest {
            local_uri: file.display().to_string(),
            title,
            duration_seconds: duration,
            category_ids: selector.selected_ids().to_vec(),
        })
        .await?;

    println!("Audio shared: {}", published.audio_url);
    Ok(())
}

async fn delete(app: &App, post_id: &PostId) -> anyhow::Result<()> {
    let feed = app.loaded_feed().await?;
    let Some(post) = feed.post(post_id) else {
        bail!("No post with id {post_id}");
    };

    let remover = PostRemover::new(feed, app.player(), app.client.clone(), app.client.clone());
    remover.delete(&post).await?;
    println!("Deleted {post_id}");
    Ok(())
}

async fn whoami(app: &App) -> anyhow::Result<()> {
    match app.client.fetch_current_user().await? {
        Some(user) => match user.email {
            Some(email) => println!("{} <{}>", user.id, email),
            None => println!("{}", user.id),
        },
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn profile(app: &App, update: ProfileUpdate) -> anyhow::Result<()> {
    let editor = ProfileEditor::new(app.client.clone(), app.client.clone());

    let profile = if update == ProfileUpdate::default() {
        editor.load().await?
    } else {
        Some(editor.save(update).await?)
    };

    match profile {
        Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
        None => println!("No profile"),
    }
    Ok(())
}

async fn watch(app: &App, frames: Option<PathBuf>) -> anyhow::Result<()> {
    let feed = app.feed();
    let mut updates = feed.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let (phase, count) = {
                let snapshot = updates.borrow_and_update();
                (snapshot.phase, snapshot.posts.len())
            };
            eprintln!("feed: {count} posts ({phase:?})");
        }
    });

    match frames {
        None => watch_live(app, feed.clone()).await?,
        Some(path) => replay(app, feed.clone(), path).await?,
    }

    printer.abort();
    print_posts(&feed.posts());
    Ok(())
}

/// Follow the backend's change feed until Ctrl-C or the socket closes
async fn watch_live(app: &App, feed: Arc<FeedManager>) -> anyhow::Result<()> {
    let supervisor = SessionSupervisor::new(feed, app.client.clone(), app.player());
    supervisor.handle(app.session.clone()).await?;
    if !supervisor.is_live() {
        bail!("Live changes are unavailable");
    }
    eprintln!("Watching live changes, Ctrl-C to stop");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal?,
        () = async {
            while supervisor.is_live() {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        } => eprintln!("Change feed closed"),
    }
    supervisor.shutdown();
    Ok(())
}

/// Apply recorded frames from a file, or stdin for `-`
async fn replay(app: &App, feed: Arc<FeedManager>, path: PathBuf) -> anyhow::Result<()> {
    let (replay, reader) = if path.as_os_str() == "-" {
        ReplayFeed::spawn(BufReader::new(tokio::io::stdin()))
    } else {
        let file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("Cannot open {}", path.display()))?;
        ReplayFeed::spawn(BufReader::new(file))
    };

    let supervisor = SessionSupervisor::new(feed, Arc::new(replay), app.player());
    supervisor.handle(app.session.clone()).await?;

    let replayed = reader.await?;
    while supervisor.is_live() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    supervisor.shutdown();

    tracing::info!(frames = replayed, "Replay finished");
    Ok(())
}
