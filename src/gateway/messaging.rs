use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use super::{Formatting, MessagingGateway};
use crate::{
    error::GatewayError,
    models::{ChatId, MessageRef},
};

/// Gateway that writes every message to stdout
#[derive(Debug, Default)]
pub struct ConsoleGateway {
    next_message_id: AtomicI64,
}

impl ConsoleGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagingGateway for ConsoleGateway {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        formatting: &Formatting,
    ) -> Result<MessageRef, GatewayError> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::Relaxed) + 1;
        println!("[chat {} #{}]\n{}", chat_id, message_id, text);
        if let Some(label) = &formatting.join_button {
            println!("  [ {} ]", label);
        }
        Ok(MessageRef {
            chat_id,
            message_id,
        })
    }

    async fn edit(
        &self,
        message: MessageRef,
        text: &str,
        formatting: &Formatting,
    ) -> Result<(), GatewayError> {
        if message.message_id > self.next_message_id.load(Ordering::Relaxed) {
            return Err(GatewayError::MessageNotFound {
                chat_id: message.chat_id,
                message_id: message.message_id,
            });
        }
        println!("[chat {} #{} edited]\n{}", message.chat_id, message.message_id, text);
        if let Some(label) = &formatting.join_button {
            println!("  [ {} ]", label);
        }
        Ok(())
    }

    async fn delete(&self, message: MessageRef) -> Result<(), GatewayError> {
        tracing::debug!(
            "Deleted message {} in chat {}",
            message.message_id,
            message.chat_id
        );
        Ok(())
    }
}
