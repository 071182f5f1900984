//! The companion engine: chat exchanges, progression, world assignment and
//! the simulated Xbox Live flows. Invoked by UI event handlers; everything
//! user-visible comes back as [`CompanionEvent`]s on a channel.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::companion::{Achievement, Companion, CompanionDraft, BUILTIN_TEMPLATES};
use crate::config::CompanionConfig;
use crate::dialogue::{self, ChatEntry, ConversationLog};
use crate::progression::{self, ProgressReport};
use crate::roster::RosterStore;
use crate::xbox::{FriendNetwork, XboxLiveClient};

/// Notifications the UI turns into toasts and chat updates.
#[derive(Debug, Clone)]
pub enum CompanionEvent {
    CompanionCreated {
        companion_id: String,
        name: String,
    },
    MessagePosted {
        companion_id: String,
        entry: ChatEntry,
    },
    LevelUp {
        companion_id: String,
        level: u32,
    },
    AchievementUnlocked {
        companion_id: String,
        achievement: Achievement,
    },
    WorldAssigned {
        companion_id: String,
        world: String,
    },
    XboxLinked {
        companion_id: String,
        gamertag: String,
    },
    FriendRequestSent {
        companion_id: String,
        message: String,
    },
    JoiningGame {
        companion_id: String,
        message: String,
    },
    ActionRefused {
        companion_id: String,
        reason: String,
    },
    XboxFailed {
        companion_id: String,
        reason: String,
    },
}

struct PendingReply {
    companion_id: String,
    handle: JoinHandle<()>,
}

pub struct CompanionEngine {
    config: CompanionConfig,
    store: Arc<RosterStore>,
    network: Arc<dyn FriendNetwork>,
    events: flume::Sender<CompanionEvent>,
    logs: Mutex<ConversationLog>,
    selected: Mutex<Option<String>>,
    pending_replies: Mutex<Vec<PendingReply>>,
}

impl CompanionEngine {
    pub fn new(
        config: CompanionConfig,
        store: Arc<RosterStore>,
        network: Arc<dyn FriendNetwork>,
    ) -> (Arc<Self>, flume::Receiver<CompanionEvent>) {
        let (events, rx) = flume::unbounded();
        let engine = Arc::new(Self {
            config,
            store,
            network,
            events,
            logs: Mutex::new(ConversationLog::new()),
            selected: Mutex::new(None),
            pending_replies: Mutex::new(Vec::new()),
        });
        (engine, rx)
    }

    /// Build an engine from config alone: roster store at the configured path,
    /// real HTTP client for the simulated backend.
    pub fn bootstrap(
        config: CompanionConfig,
    ) -> Result<(Arc<Self>, flume::Receiver<CompanionEvent>)> {
        let store = Arc::new(RosterStore::new(&config.database_path)?);
        let network = Arc::new(XboxLiveClient::new(
            config.xbox_api_url.clone(),
            config.xbox_token.clone(),
        ));
        tracing::info!("Companion engine starting, backend: {}", config.xbox_api_url);
        Ok(Self::new(config, store, network))
    }

    fn emit(&self, event: CompanionEvent) {
        let _ = self.events.send(event);
    }

    fn lock_logs(&self) -> Result<MutexGuard<'_, ConversationLog>> {
        self.logs
            .lock()
            .map_err(|e| anyhow!("Conversation log lock poisoned: {}", e))
    }

    fn lock_selected(&self) -> Result<MutexGuard<'_, Option<String>>> {
        self.selected
            .lock()
            .map_err(|e| anyhow!("Selection lock poisoned: {}", e))
    }

    fn lock_pending(&self) -> Result<MutexGuard<'_, Vec<PendingReply>>> {
        self.pending_replies
            .lock()
            .map_err(|e| anyhow!("Pending reply lock poisoned: {}", e))
    }

    /// Current roster snapshot.
    pub fn roster(&self) -> Result<Vec<Companion>> {
        self.store.load()
    }

    /// Conversation history for one companion.
    pub fn history(&self, companion_id: &str) -> Result<Vec<ChatEntry>> {
        Ok(self.lock_logs()?.history(companion_id).to_vec())
    }

    /// Validate and add a new companion. A failed validation refuses the
    /// action and leaves the roster untouched.
    pub fn create_companion(&self, draft: CompanionDraft) -> Result<Companion> {
        let companion = draft.build().map_err(|e| {
            tracing::warn!("Refusing companion creation: {}", e);
            e
        })?;
        self.store.add(companion.clone())?;
        tracing::info!("Created companion '{}'", companion.name);
        self.emit(CompanionEvent::CompanionCreated {
            companion_id: companion.id.clone(),
            name: companion.name.clone(),
        });
        Ok(companion)
    }

    /// Add a companion from one of the built-in presets.
    pub fn adopt_template(&self, template_id: &str) -> Result<Companion> {
        let template = BUILTIN_TEMPLATES
            .iter()
            .find(|t| t.id == template_id)
            .with_context(|| format!("No companion template '{}'", template_id))?;
        let companion = template.instantiate();
        self.store.add(companion.clone())?;
        tracing::info!("Adopted template '{}'", template.name);
        self.emit(CompanionEvent::CompanionCreated {
            companion_id: companion.id.clone(),
            name: companion.name.clone(),
        });
        Ok(companion)
    }

    /// Place a companion into a world.
    pub fn assign_world(&self, companion_id: &str, world: &str) -> Result<Companion> {
        let updated = self.store.update(companion_id, |c| {
            c.world = Some(world.to_string());
        })?;
        self.emit(CompanionEvent::WorldAssigned {
            companion_id: companion_id.to_string(),
            world: world.to_string(),
        });
        Ok(updated)
    }

    /// Switch the active conversation. Replies still pending for another
    /// companion are aborted rather than applied after the user has moved on.
    pub fn select_companion(&self, companion_id: Option<&str>) -> Result<()> {
        let mut selected = self.lock_selected()?;
        *selected = companion_id.map(|id| id.to_string());

        let mut pending = self.lock_pending()?;
        pending.retain(|reply| {
            let keep = selected.as_deref() == Some(reply.companion_id.as_str());
            if !keep {
                reply.handle.abort();
            }
            keep
        });
        Ok(())
    }

    /// Handle a user chat message for the selected companion.
    ///
    /// The user's entry is appended synchronously; the companion's reply
    /// arrives after the configured typing delay, followed by the progression
    /// update. Empty input or no selection is a silent no-op.
    pub fn send_message(self: &Arc<Self>, text: &str) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            tracing::debug!("Ignoring empty chat message");
            return Ok(());
        }
        let companion_id = match self.lock_selected()?.clone() {
            Some(id) => id,
            None => {
                tracing::debug!("No companion selected, dropping chat message");
                return Ok(());
            }
        };

        self.append_entry(&companion_id, ChatEntry::player(trimmed))?;
        self.spawn_reply(companion_id)
    }

    fn append_entry(&self, companion_id: &str, entry: ChatEntry) -> Result<()> {
        self.lock_logs()?.append(companion_id, entry.clone());
        self.emit(CompanionEvent::MessagePosted {
            companion_id: companion_id.to_string(),
            entry,
        });
        Ok(())
    }

    fn spawn_reply(self: &Arc<Self>, companion_id: String) -> Result<()> {
        let engine = Arc::clone(self);
        let id = companion_id.clone();
        let delay = Duration::from_millis(self.config.reply_delay_ms);

        let handle = tokio::spawn(async move {
            sleep(delay).await;
            if let Err(e) = engine.deliver_reply(&id) {
                tracing::error!("Failed to deliver reply for companion {}: {}", id, e);
            }
        });

        let mut pending = self.lock_pending()?;
        pending.retain(|reply| !reply.handle.is_finished());
        pending.push(PendingReply {
            companion_id,
            handle,
        });
        Ok(())
    }

    fn deliver_reply(&self, companion_id: &str) -> Result<()> {
        let companion = self
            .store
            .get(companion_id)?
            .with_context(|| format!("No companion with id '{}'", companion_id))?;

        let reply = dialogue::select_reply(&companion, &mut rand::thread_rng());
        self.append_entry(companion_id, ChatEntry::companion(reply))?;

        let xp = self.config.xp_per_message;
        let mut report = ProgressReport::default();
        let updated = self.store.update(companion_id, |c| {
            report = progression::record_exchange(c, xp);
        })?;

        if report.leveled_up() {
            tracing::info!("{} reached level {}", updated.name, updated.level);
            self.emit(CompanionEvent::LevelUp {
                companion_id: companion_id.to_string(),
                level: updated.level,
            });
        }
        for achievement in report.unlocked {
            self.emit(CompanionEvent::AchievementUnlocked {
                companion_id: companion_id.to_string(),
                achievement,
            });
        }
        Ok(())
    }

    fn report_xbox_failure(&self, companion_id: &str, reason: &str) {
        tracing::warn!("Xbox Live failure for companion {}: {}", companion_id, reason);
        self.emit(CompanionEvent::XboxFailed {
            companion_id: companion_id.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Connect a companion to Xbox Live, then send the follow-up friend
    /// request after a fixed pause. Failures surface as events; a failed
    /// connect leaves the record untouched.
    pub async fn link_xbox(&self, companion_id: &str) -> Result<()> {
        let companion = self
            .store
            .get(companion_id)?
            .with_context(|| format!("No companion with id '{}'", companion_id))?;

        let connect = match self
            .network
            .connect_friend(&companion.id, &companion.name)
            .await
        {
            Ok(response) if response.success => response,
            Ok(_) => {
                self.report_xbox_failure(companion_id, "Xbox Live rejected the connection");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!("connect_friend error: {}", e);
                self.report_xbox_failure(companion_id, "Could not reach Xbox Live");
                return Ok(());
            }
        };

        self.store.update(companion_id, |c| {
            c.xbox_linked = true;
            c.gamertag = Some(connect.gamertag.clone());
            c.xuid = Some(connect.xuid.clone());
        })?;
        tracing::info!("{} linked to Xbox Live as {}", companion.name, connect.gamertag);
        self.emit(CompanionEvent::XboxLinked {
            companion_id: companion_id.to_string(),
            gamertag: connect.gamertag.clone(),
        });

        sleep(Duration::from_millis(self.config.friend_request_delay_ms)).await;

        match self
            .network
            .send_friend_request(&connect.gamertag, &connect.xuid)
            .await
        {
            Ok(response) if response.success => {
                self.emit(CompanionEvent::FriendRequestSent {
                    companion_id: companion_id.to_string(),
                    message: response.message,
                });
            }
            Ok(_) => {
                self.report_xbox_failure(companion_id, "Friend request was rejected");
            }
            Err(e) => {
                tracing::debug!("send_friend_request error: {}", e);
                self.report_xbox_failure(companion_id, "Friend request failed");
            }
        }
        Ok(())
    }

    /// Ask the backend to bring a linked companion into a game session. A
    /// companion without the linked flag is refused before any request.
    pub async fn join_game(&self, companion_id: &str, session_id: &str) -> Result<()> {
        let companion = self
            .store
            .get(companion_id)?
            .with_context(|| format!("No companion with id '{}'", companion_id))?;

        if !companion.xbox_linked {
            tracing::warn!("{} is not linked to Xbox Live, refusing join", companion.name);
            self.emit(CompanionEvent::ActionRefused {
                companion_id: companion_id.to_string(),
                reason: "Connect the companion to Xbox Live first".to_string(),
            });
            return Ok(());
        }

        let gamertag = companion
            .gamertag
            .clone()
            .unwrap_or_else(|| format!("AI_{}", companion.name));

        match self.network.join_game(&gamertag, session_id).await {
            Ok(response) if response.success => {
                self.emit(CompanionEvent::JoiningGame {
                    companion_id: companion_id.to_string(),
                    message: response.message,
                });
            }
            Ok(_) => {
                self.report_xbox_failure(companion_id, "Join request was rejected");
            }
            Err(e) => {
                tracing::debug!("join_game error: {}", e);
                self.report_xbox_failure(companion_id, "Could not reach the game session");
            }
        }
        Ok(())
    }
}
