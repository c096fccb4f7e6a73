use soloconnect::config::{LoggingSettings, Settings};
use soloconnect::core::{DeckTuning, SeededLayout, SwipeDeck};
use soloconnect::models::{Decision, SignInRequest, SwipeRecord};
use soloconnect::replay::{load_candidates, GestureScript, Replay};
use soloconnect::services::{CandidateFeed, ProfileCache, SupabaseClient};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_target(false)
        .with_level(true);

    if log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.pretty().init();
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn Error>> {
    let store = if settings.supabase.is_configured() {
        let client = SupabaseClient::new(
            settings.supabase.url.clone(),
            settings.supabase.anon_key.clone(),
            settings.supabase.tables(),
            settings.supabase.timeout(),
        )?;
        info!("Supabase client initialized for {}", settings.supabase.url);
        Some(Arc::new(client))
    } else {
        info!("Supabase not configured, running offline");
        None
    };

    let viewer_id = match (&store, &settings.replay.user_email, &settings.replay.user_password) {
        (Some(store), Some(email), Some(password)) => {
            let session = store
                .sign_in(&SignInRequest {
                    email: email.clone(),
                    password: password.clone(),
                })
                .await?;
            Some(session.user.id)
        }
        _ => None,
    };

    let candidates_path = settings
        .replay
        .candidates_path
        .as_ref()
        .filter(|p| !p.as_os_str().is_empty());

    let candidates = match (candidates_path, &store) {
        (Some(path), _) => {
            info!("Loading candidates from {}", path.display());
            load_candidates(path)?
        }
        (None, Some(store)) => {
            let cache = Arc::new(ProfileCache::new(
                settings.cache.max_entries,
                settings.cache.ttl_secs,
            ));
            CandidateFeed::new(Arc::clone(store), cache)
                .load(viewer_id.as_deref(), settings.deck.size)
                .await?
        }
        (None, None) => {
            return Err("no candidates_path set and Supabase is not configured".into());
        }
    };

    let script = GestureScript::load(&settings.replay.gestures_path)?;
    info!(
        "Replaying {} events against {} candidates",
        script.events().len(),
        candidates.len()
    );

    // Decisions leave the deck through a channel so recording never stalls a frame
    let (tx, mut rx) = mpsc::unbounded_channel::<Decision>();
    let recorder_target = match (settings.replay.record_decisions, &store, &viewer_id) {
        (true, Some(store), Some(user_id)) => Some((Arc::clone(store), user_id.clone())),
        (true, _, _) => {
            warn!("record_decisions is set but no signed-in user; decisions will only be logged");
            None
        }
        _ => None,
    };

    let recorder = tokio::spawn(async move {
        let mut recorded = 0usize;
        while let Some(decision) = rx.recv().await {
            info!("Decision: {} -> {}", decision.candidate_id, decision.direction);

            if let Some((store, user_id)) = &recorder_target {
                let record = SwipeRecord::from_decision(user_id, &decision);
                match store.record_swipe(&record).await {
                    Ok(()) => recorded += 1,
                    Err(e) => warn!("Failed to record swipe on {}: {}", decision.candidate_id, e),
                }
            }
        }
        recorded
    });

    let mut layout = match settings.deck.seed {
        Some(seed) => SeededLayout::new(seed),
        None => SeededLayout::from_entropy(),
    };
    let mut deck = SwipeDeck::new(candidates, DeckTuning::from(&settings.deck), &mut layout, tx);

    let replay = Replay::new(settings.replay.frame_ms);
    let summary = if settings.replay.realtime {
        replay.run_paced(&mut deck, &script).await
    } else {
        replay.run(&mut deck, &script)
    };

    // Closes the channel so the recorder drains and exits
    drop(deck);
    let recorded = recorder.await?;

    info!(
        "{} decisions ({} recorded), {} events ignored",
        summary.decisions.len(),
        recorded,
        summary.ignored_events
    );

    if let (Some(store), Some(_)) = (&store, &viewer_id) {
        if let Err(e) = store.sign_out().await {
            warn!("Sign-out failed: {}", e);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&settings.logging);

    info!("Starting SoloConnect deck replay...");

    if let Err(e) = run(settings).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
