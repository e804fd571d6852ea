// src/core/commands/mod.rs

//! This module defines all supported commands, organizes them into
//! categories, and provides the central `Command` enum that encapsulates
//! their parsed state.

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::validate_arg_count;
use crate::core::protocol::{RespFrame, RespValue};

pub mod command_trait;
pub mod generic;
pub mod helpers;
pub mod list;
pub mod streams;
pub mod string;
pub mod zset;

use generic::{
    ConfigGet, Echo, Keys, PSubscribe, PUnsubscribe, Ping, Publish, Subscribe, TypeInfo,
    Unsubscribe,
};
use list::{BLPop, LLen, LPop, LPush, LRange, RPush};
use streams::{XAdd, XRange, XRead};
use string::{Get, Incr, Set};
use zset::{ZAdd, ZCard, ZRange, ZRank, ZRem, ZScore};

/// A single parsed command with its arguments.
#[derive(Debug, Clone)]
pub enum Command {
    // --- Generic ---
    Ping(Ping),
    Echo(Echo),
    Quit,
    TypeInfo(TypeInfo),
    Keys(Keys),
    ConfigGet(ConfigGet),

    // --- Strings ---
    Set(Set),
    Get(Get),
    Incr(Incr),

    // --- Lists ---
    LPush(LPush),
    RPush(RPush),
    LLen(LLen),
    LRange(LRange),
    LPop(LPop),
    BLPop(BLPop),

    // --- Sorted sets ---
    ZAdd(ZAdd),
    ZRank(ZRank),
    ZRange(ZRange),
    ZScore(ZScore),
    ZRem(ZRem),
    ZCard(ZCard),

    // --- Streams ---
    XAdd(XAdd),
    XRange(XRange),
    XRead(XRead),

    // --- Pub/Sub ---
    Subscribe(Subscribe),
    Unsubscribe(Unsubscribe),
    PSubscribe(PSubscribe),
    PUnsubscribe(PUnsubscribe),
    Publish(Publish),

    // --- Transactions ---
    Multi,
    Exec,
    Discard,
}

/// Extracts the uppercased command name from a request frame, if the frame
/// has the `array of bulk strings` shape. Used for transaction queue-time
/// interception, before full parsing.
pub fn frame_command_name(frame: &RespFrame) -> Option<String> {
    if let RespFrame::Array(items) = frame
        && let Some(RespFrame::BulkString(name)) = items.first()
    {
        return Some(String::from_utf8_lossy(name).to_ascii_uppercase());
    }
    None
}

impl TryFrom<RespFrame> for Command {
    type Error = CitrineError;

    /// Parses a request frame into a command. Request frames must be arrays
    /// of bulk strings; anything else is a protocol error that closes the
    /// connection.
    fn try_from(frame: RespFrame) -> Result<Self, Self::Error> {
        let RespFrame::Array(items) = frame else {
            return Err(CitrineError::ProtocolError(
                "expected an array of bulk strings".to_string(),
            ));
        };
        let Some((name_frame, args)) = items.split_first() else {
            return Err(CitrineError::ProtocolError("empty command array".to_string()));
        };
        let RespFrame::BulkString(name) = name_frame else {
            return Err(CitrineError::ProtocolError(
                "command name must be a bulk string".to_string(),
            ));
        };
        let name = String::from_utf8_lossy(name).to_ascii_uppercase();

        match name.as_str() {
            "PING" => Ping::parse(args).map(Command::Ping),
            "ECHO" => Echo::parse(args).map(Command::Echo),
            "QUIT" => validate_arg_count(args, 0, "quit").map(|_| Command::Quit),
            "TYPE" => TypeInfo::parse(args).map(Command::TypeInfo),
            "KEYS" => Keys::parse(args).map(Command::Keys),
            "CONFIG" => ConfigGet::parse(args).map(Command::ConfigGet),

            "SET" => Set::parse(args).map(Command::Set),
            "GET" => Get::parse(args).map(Command::Get),
            "INCR" => Incr::parse(args).map(Command::Incr),

            "LPUSH" => LPush::parse(args).map(Command::LPush),
            "RPUSH" => RPush::parse(args).map(Command::RPush),
            "LLEN" => LLen::parse(args).map(Command::LLen),
            "LRANGE" => LRange::parse(args).map(Command::LRange),
            "LPOP" => LPop::parse(args).map(Command::LPop),
            "BLPOP" => BLPop::parse(args).map(Command::BLPop),

            "ZADD" => ZAdd::parse(args).map(Command::ZAdd),
            "ZRANK" => ZRank::parse(args).map(Command::ZRank),
            "ZRANGE" => ZRange::parse(args).map(Command::ZRange),
            "ZSCORE" => ZScore::parse(args).map(Command::ZScore),
            "ZREM" => ZRem::parse(args).map(Command::ZRem),
            "ZCARD" => ZCard::parse(args).map(Command::ZCard),

            "XADD" => XAdd::parse(args).map(Command::XAdd),
            "XRANGE" => XRange::parse(args).map(Command::XRange),
            "XREAD" => XRead::parse(args).map(Command::XRead),

            "SUBSCRIBE" => Subscribe::parse(args).map(Command::Subscribe),
            "UNSUBSCRIBE" => Unsubscribe::parse(args).map(Command::Unsubscribe),
            "PSUBSCRIBE" => PSubscribe::parse(args).map(Command::PSubscribe),
            "PUNSUBSCRIBE" => PUnsubscribe::parse(args).map(Command::PUnsubscribe),
            "PUBLISH" => Publish::parse(args).map(Command::Publish),

            "MULTI" => validate_arg_count(args, 0, "multi").map(|_| Command::Multi),
            "EXEC" => validate_arg_count(args, 0, "exec").map(|_| Command::Exec),
            "DISCARD" => validate_arg_count(args, 0, "discard").map(|_| Command::Discard),

            _ => Err(CitrineError::UnknownCommand(name)),
        }
    }
}

impl Command {
    /// The canonical (lowercase) command name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping(_) => "ping",
            Command::Echo(_) => "echo",
            Command::Quit => "quit",
            Command::TypeInfo(_) => "type",
            Command::Keys(_) => "keys",
            Command::ConfigGet(_) => "config",
            Command::Set(_) => "set",
            Command::Get(_) => "get",
            Command::Incr(_) => "incr",
            Command::LPush(_) => "lpush",
            Command::RPush(_) => "rpush",
            Command::LLen(_) => "llen",
            Command::LRange(_) => "lrange",
            Command::LPop(_) => "lpop",
            Command::BLPop(_) => "blpop",
            Command::ZAdd(_) => "zadd",
            Command::ZRank(_) => "zrank",
            Command::ZRange(_) => "zrange",
            Command::ZScore(_) => "zscore",
            Command::ZRem(_) => "zrem",
            Command::ZCard(_) => "zcard",
            Command::XAdd(_) => "xadd",
            Command::XRange(_) => "xrange",
            Command::XRead(_) => "xread",
            Command::Subscribe(_) => "subscribe",
            Command::Unsubscribe(_) => "unsubscribe",
            Command::PSubscribe(_) => "psubscribe",
            Command::PUnsubscribe(_) => "punsubscribe",
            Command::Publish(_) => "publish",
            Command::Multi => "multi",
            Command::Exec => "exec",
            Command::Discard => "discard",
        }
    }

    /// The reduced command surface available while the client is subscribed.
    pub fn is_allowed_while_subscribed(&self) -> bool {
        matches!(
            self,
            Command::Subscribe(_)
                | Command::Unsubscribe(_)
                | Command::PSubscribe(_)
                | Command::PUnsubscribe(_)
                | Command::Ping(_)
                | Command::Quit
        )
    }

    /// Executes a data command against the shared state. Session-affecting
    /// commands (pub/sub, transactions, PING, QUIT) are handled by the
    /// router and never reach this dispatch.
    pub async fn execute(
        &self,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<RespValue, CitrineError> {
        match self {
            Command::Echo(cmd) => cmd.execute(ctx).await,
            Command::TypeInfo(cmd) => cmd.execute(ctx).await,
            Command::Keys(cmd) => cmd.execute(ctx).await,
            Command::ConfigGet(cmd) => cmd.execute(ctx).await,
            Command::Set(cmd) => cmd.execute(ctx).await,
            Command::Get(cmd) => cmd.execute(ctx).await,
            Command::Incr(cmd) => cmd.execute(ctx).await,
            Command::LPush(cmd) => cmd.execute(ctx).await,
            Command::RPush(cmd) => cmd.execute(ctx).await,
            Command::LLen(cmd) => cmd.execute(ctx).await,
            Command::LRange(cmd) => cmd.execute(ctx).await,
            Command::LPop(cmd) => cmd.execute(ctx).await,
            Command::BLPop(cmd) => cmd.execute(ctx).await,
            Command::ZAdd(cmd) => cmd.execute(ctx).await,
            Command::ZRank(cmd) => cmd.execute(ctx).await,
            Command::ZRange(cmd) => cmd.execute(ctx).await,
            Command::ZScore(cmd) => cmd.execute(ctx).await,
            Command::ZRem(cmd) => cmd.execute(ctx).await,
            Command::ZCard(cmd) => cmd.execute(ctx).await,
            Command::XAdd(cmd) => cmd.execute(ctx).await,
            Command::XRange(cmd) => cmd.execute(ctx).await,
            Command::XRead(cmd) => cmd.execute(ctx).await,
            Command::Publish(cmd) => cmd.execute(ctx).await,
            _ => Err(CitrineError::Internal(format!(
                "command '{}' is routed, not executed",
                self.name()
            ))),
        }
    }
}
