//! Turn execution.
//!
//! A [`Runner`] binds one agent to one model provider and one pair of
//! session/memory backends. Running a turn yields the agent's events as a
//! stream: model replies, then tool responses, until the model answers
//! without requesting a tool.

use crate::agent::Agent;
use crate::error::AgentError;
use crate::providers::{LlmRequest, ModelProvider};
use crate::session::SessionService;
use crate::tools::{ToolContext, ToolExecutor};
use crate::Result;
use async_stream::stream;
use futures::Stream;
use salesassist_core::id;
use salesassist_core::types::{
    Content, Event, FunctionCall, FunctionResponse, Part, Role, Session, SessionKey,
};
use salesassist_core::Backend;
use salesassist_memory::{MemoryService, SearchMemoryResponse};
use serde_json::Value;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Application name sessions and memories are filed under.
pub const APP_NAME: &str = "sales-assist-app";

/// A finite, ordered stream of events for one turn.
pub type EventStream<'a> = Pin<Box<dyn Stream<Item = Result<Event>> + Send + 'a>>;

/// Per-turn limits.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum model calls in one turn.
    pub max_llm_calls: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { max_llm_calls: 20 }
    }
}

/// Drives turns for one agent.
pub struct Runner {
    app_name: String,
    agent: Arc<Agent>,
    provider: Arc<dyn ModelProvider>,
    session_service: Arc<dyn SessionService>,
    memory_service: Arc<dyn MemoryService>,
    session_backend: Backend,
    memory_backend: Backend,
    run_config: RunConfig,
    executor: ToolExecutor,
}

impl Runner {
    /// Create a runner with local backend tags.
    pub fn new(
        agent: Arc<Agent>,
        provider: Arc<dyn ModelProvider>,
        session_service: Arc<dyn SessionService>,
        memory_service: Arc<dyn MemoryService>,
    ) -> Self {
        let executor = ToolExecutor::new(agent.tools.clone());
        Self {
            app_name: APP_NAME.to_string(),
            agent,
            provider,
            session_service,
            memory_service,
            session_backend: Backend::Local,
            memory_backend: Backend::Local,
            run_config: RunConfig::default(),
            executor,
        }
    }

    /// Record which backends the services belong to.
    pub fn with_backends(mut self, session_backend: Backend, memory_backend: Backend) -> Self {
        self.session_backend = session_backend;
        self.memory_backend = memory_backend;
        self
    }

    /// Set the per-turn limits.
    pub fn with_run_config(mut self, run_config: RunConfig) -> Self {
        self.run_config = run_config;
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    pub fn session_backend(&self) -> &Backend {
        &self.session_backend
    }

    pub fn memory_backend(&self) -> &Backend {
        &self.memory_backend
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    fn key(&self, user_id: &str, session_id: &str) -> SessionKey {
        SessionKey::new(&self.app_name, user_id, session_id)
    }

    /// Create a session with initial state, e.g. a delegated token.
    pub async fn create_session(
        &self,
        user_id: &str,
        session_id: &str,
        state: HashMap<String, Value>,
    ) -> Result<Session> {
        self.session_service
            .create_session(&self.key(user_id, session_id), state)
            .await
    }

    /// Load a session.
    pub async fn get_session(&self, user_id: &str, session_id: &str) -> Result<Option<Session>> {
        self.session_service
            .get_session(&self.key(user_id, session_id))
            .await
    }

    async fn load_or_create(&self, key: &SessionKey) -> Result<Session> {
        if let Some(session) = self.session_service.get_session(key).await? {
            return Ok(session);
        }
        info!("Session {} not found, creating it", key);
        self.session_service.create_session(key, HashMap::new()).await
    }

    /// Run one turn.
    ///
    /// The user message is stored but not yielded. Every yielded event has
    /// already been appended to the session. An `Err` item ends the stream.
    pub fn run(&self, user_id: &str, session_id: &str, message: &str) -> EventStream<'_> {
        let key = self.key(user_id, session_id);
        let message = message.to_string();

        Box::pin(stream! {
            let mut session = match self.load_or_create(&key).await {
                Ok(s) => s,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let invocation_id = id::invocation_id();
            debug!("Starting turn {} in session {}", invocation_id, key);

            let user_event = Event::user_message(&invocation_id, message);
            if let Err(e) = self.session_service.append_event(&mut session, user_event).await {
                yield Err(e);
                return;
            }

            let mut llm_calls = 0;
            loop {
                if llm_calls >= self.run_config.max_llm_calls {
                    warn!("Turn {} hit the model call limit", invocation_id);
                    yield Err(AgentError::LlmCallLimit(self.run_config.max_llm_calls));
                    return;
                }
                llm_calls += 1;

                let request = self.build_request(&session).await;
                let response = match self.provider.generate(request).await {
                    Ok(r) => r,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                let model_event = Event::new(&invocation_id, &self.agent.name)
                    .with_content(response.content)
                    .with_usage(response.usage);
                let calls: Vec<FunctionCall> =
                    model_event.function_calls().into_iter().cloned().collect();

                if let Err(e) = self.session_service.append_event(&mut session, model_event.clone()).await {
                    yield Err(e);
                    return;
                }
                yield Ok(model_event);

                if calls.is_empty() {
                    break;
                }

                let context = ToolContext::new(
                    &invocation_id,
                    &self.agent.name,
                    &session.user_id,
                    &session.id,
                )
                .with_state(session.state.clone());

                let mut parts = Vec::with_capacity(calls.len());
                for call in &calls {
                    parts.push(Part::FunctionResponse(self.call_tool(call, &context).await));
                }

                let response_event = Event::new(&invocation_id, &self.agent.name)
                    .with_content(Content::new(Role::User, parts));
                if let Err(e) = self.session_service.append_event(&mut session, response_event.clone()).await {
                    yield Err(e);
                    return;
                }
                yield Ok(response_event);
            }

            debug!("Turn {} finished after {} model calls", invocation_id, llm_calls);
        })
    }

    async fn build_request(&self, session: &Session) -> LlmRequest {
        LlmRequest {
            model: self.agent.model.clone(),
            system_instruction: Some(self.agent.instruction.clone()),
            contents: session
                .events
                .iter()
                .filter_map(|e| e.content.clone())
                .collect(),
            tools: self.agent.tools.definitions().await,
        }
    }

    /// Execute one function call; failures become error responses.
    async fn call_tool(&self, call: &FunctionCall, context: &ToolContext) -> FunctionResponse {
        let call_id = call.id.clone().unwrap_or_else(id::function_call_id);
        let context = context.clone().with_function_call_id(&call_id);
        let args = Value::Object(call.args.clone());

        match self
            .executor
            .execute(&call_id, &call.name, args, Some(&context))
            .await
        {
            Ok(result) if result.is_error => {
                FunctionResponse::error(call.id.clone(), &call.name, result.output_text())
            }
            Ok(result) => {
                debug!(
                    "Tool '{}' finished in {}ms",
                    call.name,
                    result.duration_ms.unwrap_or(0)
                );
                FunctionResponse::result(call.id.clone(), &call.name, result.output)
            }
            Err(e) => {
                warn!("Tool '{}' failed: {}", call.name, e);
                FunctionResponse::error(call.id.clone(), &call.name, e.to_string())
            }
        }
    }

    /// Hand a finished session to the memory backend.
    pub async fn add_session_to_memory(&self, user_id: &str, session_id: &str) -> Result<()> {
        let key = self.key(user_id, session_id);
        let session = self
            .session_service
            .get_session(&key)
            .await?
            .ok_or_else(|| AgentError::SessionNotFound(key.to_string()))?;
        self.memory_service.add_session_to_memory(&session).await?;
        info!("Added session {} to {} memory", key, self.memory_service.name());
        Ok(())
    }

    /// Search the user's long-term memory.
    pub async fn search_memory(&self, user_id: &str, query: &str) -> Result<SearchMemoryResponse> {
        Ok(self
            .memory_service
            .search_memory(&self.app_name, user_id, query)
            .await?)
    }
}
