use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;

use crate::antinuke::AdminAction;

/// Configuration for the GuildPulse engagement core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Economy tunables (points, cooldowns, streaks)
    pub economy: EconomyConfig,
    /// Anti-nuke detector tunables
    pub antinuke: AntiNukeConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// Tunables for the points/XP ledger.
///
/// None of these are baked into engine logic; changing them here changes
/// behaviour without touching the engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Seconds between message point awards for the same user
    pub message_cooldown_secs: i64,
    /// Inclusive lower bound of the random message point draw
    pub message_points_min: u64,
    /// Inclusive upper bound of the random message point draw
    pub message_points_max: u64,
    /// Voice interval length that earns one award
    pub voice_interval_secs: u64,
    /// Points per completed voice interval
    pub voice_points_per_interval: u64,
    /// Base points for a daily claim
    pub daily_base_points: u64,
    /// Extra points per consecutive streak day beyond the first
    pub daily_streak_bonus: u64,
    /// Rolling cooldown between daily claims
    pub daily_cooldown_hours: i64,
    /// Gap beyond which a streak resets to zero
    pub streak_break_hours: i64,
    /// XP divisor in the level curve: level = floor(sqrt(xp / divisor))
    pub xp_divisor: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            message_cooldown_secs: 60,
            message_points_min: 1,
            message_points_max: 5,
            voice_interval_secs: 600,
            voice_points_per_interval: 10,
            daily_base_points: 100,
            daily_streak_bonus: 10,
            daily_cooldown_hours: 24,
            streak_break_hours: 48,
            xp_divisor: 100,
        }
    }
}

/// Tunables for the anti-nuke detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiNukeConfig {
    /// Actions counted toward the lockdown threshold
    pub dangerous_actions: HashSet<AdminAction>,
    /// Trailing window over the audit log, in seconds
    pub time_window_secs: i64,
    /// Dangerous-action count that triggers a lockdown
    pub max_actions: u32,
}

impl Default for AntiNukeConfig {
    fn default() -> Self {
        let dangerous_actions = [
            AdminAction::ChannelDelete,
            AdminAction::RoleDelete,
            AdminAction::MemberBan,
            AdminAction::MemberKick,
            AdminAction::WebhookDelete,
            AdminAction::GuildUpdate,
        ]
        .into_iter()
        .collect();

        Self {
            dangerous_actions,
            time_window_secs: 30,
            max_actions: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug)
    pub level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8090,
            },
            economy: EconomyConfig::default(),
            antinuke: AntiNukeConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl CoreConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("GUILDPULSE_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = env::var("GUILDPULSE_PORT") {
            config.server.port = port.parse().context("Invalid GUILDPULSE_PORT value")?;
        }

        // Economy configuration
        if let Ok(secs) = env::var("GUILDPULSE_MESSAGE_COOLDOWN_SECS") {
            config.economy.message_cooldown_secs = secs
                .parse()
                .context("Invalid GUILDPULSE_MESSAGE_COOLDOWN_SECS value")?;
        }

        if let Ok(min) = env::var("GUILDPULSE_MESSAGE_POINTS_MIN") {
            config.economy.message_points_min = min
                .parse()
                .context("Invalid GUILDPULSE_MESSAGE_POINTS_MIN value")?;
        }

        if let Ok(max) = env::var("GUILDPULSE_MESSAGE_POINTS_MAX") {
            config.economy.message_points_max = max
                .parse()
                .context("Invalid GUILDPULSE_MESSAGE_POINTS_MAX value")?;
        }

        if let Ok(secs) = env::var("GUILDPULSE_VOICE_INTERVAL_SECS") {
            config.economy.voice_interval_secs = secs
                .parse()
                .context("Invalid GUILDPULSE_VOICE_INTERVAL_SECS value")?;
        }

        if let Ok(points) = env::var("GUILDPULSE_VOICE_POINTS_PER_INTERVAL") {
            config.economy.voice_points_per_interval = points
                .parse()
                .context("Invalid GUILDPULSE_VOICE_POINTS_PER_INTERVAL value")?;
        }

        if let Ok(points) = env::var("GUILDPULSE_DAILY_BASE_POINTS") {
            config.economy.daily_base_points = points
                .parse()
                .context("Invalid GUILDPULSE_DAILY_BASE_POINTS value")?;
        }

        if let Ok(bonus) = env::var("GUILDPULSE_DAILY_STREAK_BONUS") {
            config.economy.daily_streak_bonus = bonus
                .parse()
                .context("Invalid GUILDPULSE_DAILY_STREAK_BONUS value")?;
        }

        if let Ok(hours) = env::var("GUILDPULSE_DAILY_COOLDOWN_HOURS") {
            config.economy.daily_cooldown_hours = hours
                .parse()
                .context("Invalid GUILDPULSE_DAILY_COOLDOWN_HOURS value")?;
        }

        if let Ok(hours) = env::var("GUILDPULSE_STREAK_BREAK_HOURS") {
            config.economy.streak_break_hours = hours
                .parse()
                .context("Invalid GUILDPULSE_STREAK_BREAK_HOURS value")?;
        }

        if let Ok(divisor) = env::var("GUILDPULSE_XP_DIVISOR") {
            config.economy.xp_divisor = divisor
                .parse()
                .context("Invalid GUILDPULSE_XP_DIVISOR value")?;
        }

        // Anti-nuke configuration
        if let Ok(actions) = env::var("GUILDPULSE_ANTINUKE_DANGEROUS_ACTIONS") {
            let mut parsed = HashSet::new();
            for name in actions.split(',').filter(|s| !s.trim().is_empty()) {
                let action: AdminAction = name.parse().map_err(|e| {
                    anyhow::anyhow!("Invalid GUILDPULSE_ANTINUKE_DANGEROUS_ACTIONS entry: {}", e)
                })?;
                parsed.insert(action);
            }
            config.antinuke.dangerous_actions = parsed;
        }

        if let Ok(secs) = env::var("GUILDPULSE_ANTINUKE_WINDOW_SECS") {
            config.antinuke.time_window_secs = secs
                .parse()
                .context("Invalid GUILDPULSE_ANTINUKE_WINDOW_SECS value")?;
        }

        if let Ok(count) = env::var("GUILDPULSE_ANTINUKE_MAX_ACTIONS") {
            config.antinuke.max_actions = count
                .parse()
                .context("Invalid GUILDPULSE_ANTINUKE_MAX_ACTIONS value")?;
        }

        // Logging configuration
        if let Ok(level) = env::var("GUILDPULSE_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        if self.economy.message_cooldown_secs <= 0 {
            return Err(anyhow::anyhow!("Message cooldown must be positive"));
        }

        if self.economy.message_points_min == 0 {
            return Err(anyhow::anyhow!("Message point minimum must be at least 1"));
        }

        if self.economy.message_points_min > self.economy.message_points_max {
            return Err(anyhow::anyhow!(
                "Message point range is inverted: min {} > max {}",
                self.economy.message_points_min,
                self.economy.message_points_max
            ));
        }

        if self.economy.voice_interval_secs == 0 {
            return Err(anyhow::anyhow!("Voice interval must be non-zero"));
        }

        if self.economy.daily_cooldown_hours <= 0 {
            return Err(anyhow::anyhow!("Daily cooldown must be positive"));
        }

        if self.economy.streak_break_hours <= self.economy.daily_cooldown_hours {
            return Err(anyhow::anyhow!(
                "Streak break window ({}h) must exceed the daily cooldown ({}h)",
                self.economy.streak_break_hours,
                self.economy.daily_cooldown_hours
            ));
        }

        if self.economy.xp_divisor == 0 {
            return Err(anyhow::anyhow!("XP divisor must be non-zero"));
        }

        if self.antinuke.dangerous_actions.is_empty() {
            return Err(anyhow::anyhow!(
                "At least one dangerous action must be configured"
            ));
        }

        if self.antinuke.time_window_secs <= 0 {
            return Err(anyhow::anyhow!("Anti-nuke window must be positive"));
        }

        if self.antinuke.max_actions == 0 {
            return Err(anyhow::anyhow!(
                "Anti-nuke action threshold must be at least 1"
            ));
        }

        Ok(())
    }
}
