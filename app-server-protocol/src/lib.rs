//! The client-facing wire protocol: discriminated client messages and
//! server events exchanged over the persistent session socket, plus the
//! validation rules that reject malformed input before it reaches the
//! session runtime.

mod client_message;
mod config;
mod server_event;
mod validate;

pub use client_message::AskResponsePayload;
pub use client_message::ApprovalResponsePayload;
pub use client_message::ClientMessage;
pub use client_message::HarnessContext;
pub use client_message::McpServerConfigPatch;
pub use config::SessionConfigPatch;
pub use config::SessionConfigSnapshot;
pub use server_event::AuthChallenge;
pub use server_event::CheckpointSummary;
pub use server_event::OutboundMessage;
pub use server_event::ProviderAuthMethodEntry;
pub use server_event::ProviderAuthMethodKind;
pub use server_event::ProviderCatalogEntry;
pub use server_event::ProviderStatusEntry;
pub use server_event::ReasoningKind;
pub use server_event::ServerEvent;
pub use server_event::SessionSummary;
pub use server_event::SkillDescriptor;
pub use server_event::StreamPart;
pub use server_event::ToolDescriptor;
pub use server_event::TodoItem;
pub use server_event::TranscriptRecord;
pub use validate::parse_client_message;
pub use validate::validate_client_message;
