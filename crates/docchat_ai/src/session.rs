use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use docchat_core::config::DocChatConfig;
use docchat_core::domain::{LoadReport, LoadSummary, Turn};
use docchat_core::error::AppError;
use docchat_core::ingest::load_documents;
use tracing::info;

use crate::chat::{Answer, ChainSettings, RetrievalChain};
use crate::chunking::Chunker;
use crate::embeddings::openai_embed::OpenAiEmbedder;
use crate::embeddings::{embed_texts_until, Embedder};
use crate::history::History;
use crate::index::VectorIndex;
use crate::llm::openai_chat::OpenAiChatModel;
use crate::llm::ChatModel;
use crate::openai::OpenAiClient;
use crate::retry::RetryPolicy;

pub type SessionHandle = Arc<Session>;

/// Index, model handles and history for one uploaded document set.
pub struct Session {
    id: u64,
    index: VectorIndex,
    chain: RetrievalChain,
    history: Mutex<History>,
    summary: LoadSummary,
}

impl Session {
    /// Chunk, embed and index an already loaded document set.
    ///
    /// `abandon` is polled between embedding batches; once it returns true the build stops
    /// with `SESSION_SUPERSEDED` and nothing is kept.
    pub fn build(
        id: u64,
        report: LoadReport,
        chunker: &Chunker,
        chain: RetrievalChain,
        batch_size: usize,
        abandon: &dyn Fn() -> bool,
    ) -> Result<Self, AppError> {
        if report.documents.is_empty() {
            return Err(none_loaded(&report));
        }

        let summary = LoadSummary::from(&report);
        let chunks = chunker.split_all(&report.documents);
        drop(report);
        if chunks.is_empty() {
            return Err(AppError::new(
                "DOC_NONE_LOADED",
                "Loaded documents contain no text",
            )
            .with_details(format!("sources={}", summary.sources.join(", "))));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_texts_until(
            chain.embedder(),
            &texts,
            batch_size,
            &chain.settings().retry,
            abandon,
        )?;
        let index = VectorIndex::build(chunks, vectors)?;
        info!(
            session = id,
            documents = summary.sources.len(),
            chars = summary.total_chars,
            chunks = index.len(),
            dims = index.dims(),
            "session index built"
        );

        Ok(Self {
            id,
            index,
            chain,
            history: Mutex::new(History::new()),
            summary,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn load_summary(&self) -> &LoadSummary {
        &self.summary
    }

    /// Answer `question` against this session. Only successful turns reach the history.
    pub fn ask(&self, question: &str) -> Result<Answer, AppError> {
        // Held for the whole turn so turns on one session are strictly sequential.
        let mut history = self.lock_history();
        let answer = self.chain.generate(&self.index, question, history.all())?;
        history.append(Turn::new(question.trim(), answer.text.clone()));
        Ok(answer)
    }

    pub fn history(&self) -> Vec<Turn> {
        self.lock_history().all().to_vec()
    }

    pub fn history_len(&self) -> usize {
        self.lock_history().len()
    }

    pub fn clear_history(&self) {
        self.lock_history().clear();
    }

    fn lock_history(&self) -> MutexGuard<'_, History> {
        // History is only ever appended whole turns, so a poisoned guard is still consistent.
        self.history.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("chunks", &self.index.len())
            .field("dims", &self.index.dims())
            .field("sources", &self.summary.sources)
            .finish()
    }
}

fn none_loaded(report: &LoadReport) -> AppError {
    let details = report
        .failures
        .iter()
        .map(|f| format!("{}: {}", f.path, f.error))
        .collect::<Vec<_>>()
        .join("; ");
    AppError::new("DOC_NONE_LOADED", "No documents could be loaded").with_details(
        if details.is_empty() {
            format!("skipped={}", report.skipped.len())
        } else {
            details
        },
    )
}

/// Owns the single active session and swaps it atomically when a new document set arrives.
pub struct DocChat {
    chunker: Chunker,
    chain: RetrievalChain,
    batch_size: usize,
    active: Mutex<Option<SessionHandle>>,
    generation: AtomicU64,
}

impl DocChat {
    pub fn new(
        config: &DocChatConfig,
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;
        let chain = RetrievalChain::new(embedder, chat_model, ChainSettings::from(config));
        Ok(Self {
            chunker,
            chain,
            batch_size: config.embedding_batch_size,
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
        })
    }

    /// Wire the OpenAI-compatible embedder and chat model described by `config`.
    pub fn with_openai(config: &DocChatConfig) -> Result<Self, AppError> {
        let client = OpenAiClient::from_config(config)?;
        let embedder = OpenAiEmbedder::new(client.clone(), config.embedding_model.clone());
        let chat_model =
            OpenAiChatModel::new(client, config.chat_model.clone(), config.temperature);
        Self::new(config, Arc::new(embedder), Arc::new(chat_model))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.chain = self.chain.with_retry(retry);
        self
    }

    /// Load `paths`, build a session and make it the active one.
    ///
    /// On failure the previously active session stays in place. If another `create_session`
    /// gets past loading while this one is still building, this build is discarded with
    /// `SESSION_SUPERSEDED`. Calls that fail the key check or load nothing never supersede.
    pub fn create_session<P: AsRef<Path>>(&self, paths: &[P]) -> Result<SessionHandle, AppError> {
        self.chain.embedder().check_ready()?;
        let report = load_documents(paths);
        if report.documents.is_empty() {
            return Err(none_loaded(&report));
        }

        // Only a build that can actually proceed supersedes one already in flight.
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let is_stale = || self.generation.load(Ordering::SeqCst) != ticket;
        let session = Session::build(
            ticket,
            report,
            &self.chunker,
            self.chain.clone(),
            self.batch_size,
            &is_stale,
        )?;

        let mut active = self.lock_active();
        // Checked under the lock so a newer build cannot install in between.
        if is_stale() {
            info!(session = ticket, "discarding superseded build");
            return Err(AppError::new(
                "SESSION_SUPERSEDED",
                "A newer document set was submitted while this one was building",
            ));
        }
        let handle = Arc::new(session);
        *active = Some(Arc::clone(&handle));
        info!(session = ticket, "session activated");
        Ok(handle)
    }

    /// Same as [`DocChat::create_session`]; named for callers that already hold a session.
    pub fn replace_session<P: AsRef<Path>>(&self, paths: &[P]) -> Result<SessionHandle, AppError> {
        self.create_session(paths)
    }

    pub fn active(&self) -> Option<SessionHandle> {
        self.lock_active().clone()
    }

    /// Answer against whichever session is active when the call starts.
    pub fn ask(&self, question: &str) -> Result<Answer, AppError> {
        let session = self.active().ok_or_else(|| {
            AppError::new(
                "SESSION_NOT_READY",
                "No document set loaded; create a session first",
            )
        })?;
        session.ask(question)
    }

    pub fn clear_history(&self) {
        if let Some(s) = self.active() {
            s.clear_history();
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<SessionHandle>> {
        self.active.lock().unwrap_or_else(|p| p.into_inner())
    }
}
