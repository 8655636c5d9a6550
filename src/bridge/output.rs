//! Telegram output framing and sinks.
//!
//! Line-oriented consumers (wmbusmeters reading stdin, a serial port emulator)
//! expect one telegram per line in uppercase hex, by default framed as
//! `telegram=|HEX|`. Older bridge scripts used `telegram=||HEX||` or the bare
//! hex string; both are still available.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::bridge::validator::Telegram;
use crate::error::BridgeError;

/// Line encoding of an emitted telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TelegramFormat {
    /// `telegram=|HEX|`
    #[default]
    Pipe,
    /// `telegram=||HEX||`
    DoublePipe,
    /// `HEX`
    Bare,
}

impl TelegramFormat {
    /// Render uppercase hex in this format, newline included.
    pub fn format_hex(&self, hex: &str) -> String {
        match self {
            TelegramFormat::Pipe => format!("telegram=|{hex}|\n"),
            TelegramFormat::DoublePipe => format!("telegram=||{hex}||\n"),
            TelegramFormat::Bare => format!("{hex}\n"),
        }
    }

    pub fn format(&self, telegram: &Telegram) -> String {
        self.format_hex(&telegram.to_hex())
    }
}

/// Destination for accepted telegrams.
#[async_trait]
pub trait TelegramSink: Send {
    async fn emit(&mut self, telegram: &Telegram) -> Result<(), BridgeError>;

    async fn flush(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }
}

/// Writes one formatted line per telegram, flushing after each so a decoder
/// on the other end of a pipe sees it immediately.
#[derive(Debug)]
pub struct LineSink<W> {
    writer: W,
    format: TelegramFormat,
    written: u64,
}

impl<W> LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W, format: TelegramFormat) -> Self {
        Self {
            writer,
            format,
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> TelegramSink for LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn emit(&mut self, telegram: &Telegram) -> Result<(), BridgeError> {
        let line = self.format.format(telegram);
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        self.written += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), BridgeError> {
        self.writer.flush().await?;
        Ok(())
    }
}

/// Keeps every emitted telegram in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub telegrams: Vec<Telegram>,
}

#[async_trait]
impl TelegramSink for CollectingSink {
    async fn emit(&mut self, telegram: &Telegram) -> Result<(), BridgeError> {
        self.telegrams.push(telegram.clone());
        Ok(())
    }
}
