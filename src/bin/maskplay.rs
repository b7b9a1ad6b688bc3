use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use maskplay::{
    AssetCache, Canvas, EntityId, FrameIndex, FsAssetSource, GameConfig, GameEvent, GameSession,
    LabelId, MaskCompositor, Point, Size, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "maskplay", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the overlay for one frame as a PNG.
    Frame(FrameArgs),
    /// Report which entity a display-space point lands on.
    Hit(HitArgs),
    /// Score a set of assignments against the answer key.
    Score(ScoreArgs),
    /// Feed a scripted event log through a session and print host commands as JSON lines.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Game configuration JSON. Defaults to the built-in zodiac game.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SceneArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Asset root containing the mask and icon directories.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Frame index (0-based, clamped to the configured range).
    #[arg(long)]
    frame: u64,

    /// Native video resolution, `WxH`.
    #[arg(long, value_parser = parse_source_dims)]
    source: (u32, u32),

    /// Display box size, `WxH`.
    #[arg(long, value_parser = parse_display_dims)]
    display: (f64, f64),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Assignment `ENTITY=LABEL`; repeatable.
    #[arg(long = "assign", value_parser = parse_assignment)]
    assignments: Vec<(EntityId, LabelId)>,

    /// Entity drawn with the selection overlay.
    #[arg(long)]
    select: Option<u32>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct HitArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[arg(long)]
    x: f64,

    #[arg(long)]
    y: f64,
}

#[derive(Parser, Debug)]
struct ScoreArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Assignment `ENTITY=LABEL`; repeatable.
    #[arg(long = "assign", value_parser = parse_assignment)]
    assignments: Vec<(EntityId, LabelId)>,
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Asset root containing the mask and icon directories.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// JSON array of `{ "at": seconds, "event": { "event": ..., ... } }` steps.
    #[arg(long)]
    script: PathBuf,
}

#[derive(serde::Deserialize, Debug)]
struct ReplayStep {
    at: f64,
    event: GameEvent,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Hit(args) => cmd_hit(args),
        Command::Score(args) => cmd_score(args),
        Command::Replay(args) => cmd_replay(args),
    }
}

fn parse_source_dims(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got \"{s}\""))?;
    let w = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok((w, h))
}

fn parse_display_dims(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got \"{s}\""))?;
    let w = w.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok((w, h))
}

fn parse_assignment(s: &str) -> Result<(EntityId, LabelId), String> {
    let (e, l) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ENTITY=LABEL, got \"{s}\""))?;
    let e = e.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok((EntityId(e), LabelId::new(l.trim())))
}

fn load_config(args: &ConfigArgs) -> anyhow::Result<GameConfig> {
    match &args.config {
        Some(path) => Ok(GameConfig::from_path(path)?),
        None => Ok(GameConfig::zodiac()),
    }
}

fn load_assets(cfg: &GameConfig, root: &Path) -> AssetCache {
    AssetCache::load(cfg, &FsAssetSource::new(root))
}

fn checked_assignments(
    cfg: &GameConfig,
    pairs: &[(EntityId, LabelId)],
) -> anyhow::Result<BTreeMap<EntityId, LabelId>> {
    let mut out = BTreeMap::new();
    for (entity, label) in pairs {
        anyhow::ensure!(
            cfg.contains_entity(*entity),
            "entity {entity} is outside [0, {})",
            cfg.entity_count
        );
        anyhow::ensure!(cfg.label(label).is_some(), "unknown label \"{label}\"");
        out.insert(*entity, label.clone());
    }
    Ok(out)
}

fn scene_viewport(scene: &SceneArgs) -> anyhow::Result<Viewport> {
    let source = Canvas::new(scene.source.0, scene.source.1)?;
    let display = Size::new(scene.display.0, scene.display.1);
    Ok(Viewport::cover(source, display)?)
}

fn scene_frame(cfg: &GameConfig, scene: &SceneArgs) -> FrameIndex {
    FrameIndex(scene.frame.min(cfg.last_frame().0))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.scene.config)?;
    let assignments = checked_assignments(&cfg, &args.assignments)?;
    let selection = args.select.map(EntityId);
    if let Some(sel) = selection {
        anyhow::ensure!(cfg.contains_entity(sel), "entity {sel} is outside the game");
    }

    let viewport = scene_viewport(&args.scene)?;
    let assets = load_assets(&cfg, &args.scene.root);
    let frame = scene_frame(&cfg, &args.scene);

    let mut compositor = MaskCompositor::new(viewport.surface());
    let surface = compositor.render(&cfg, &assets, &viewport, frame, &assignments, selection)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let img = image::RgbaImage::from_raw(surface.width, surface.height, surface.to_straight_rgba8())
        .context("surface buffer does not match its dimensions")?;
    img.save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    Ok(())
}

fn cmd_hit(args: HitArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.scene.config)?;
    let viewport = scene_viewport(&args.scene)?;
    let assets = load_assets(&cfg, &args.scene.root);
    let frame = scene_frame(&cfg, &args.scene);

    match maskplay::hit_test(&cfg, &assets, &viewport, frame, Point::new(args.x, args.y)) {
        Some(entity) => println!("{entity}"),
        None => println!("none"),
    }
    Ok(())
}

fn cmd_score(args: ScoreArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.config)?;
    let assignments = checked_assignments(&cfg, &args.assignments)?;
    let report = maskplay::score(&cfg, &assignments);
    println!("{report}");
    println!("{}", report.message());
    Ok(())
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let cfg = Arc::new(load_config(&args.config)?);

    let f = File::open(&args.script)
        .with_context(|| format!("open replay script '{}'", args.script.display()))?;
    let steps: Vec<ReplayStep> = serde_json::from_reader(BufReader::new(f))
        .with_context(|| "parse replay script JSON")?;

    let assets = Arc::new(load_assets(&cfg, &args.root));
    let mut session = GameSession::with_assets(cfg, assets);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for step in steps {
        let redraw = session.tick(step.at);
        let commands = session.handle(step.event)?;
        let line = serde_json::json!({
            "at": step.at,
            "frame": session.current_frame().map(|f| f.0),
            "frame_changed": redraw,
            "phase": format!("{:?}", session.phase()),
            "commands": commands,
        });
        writeln!(out, "{line}")?;
    }
    Ok(())
}
