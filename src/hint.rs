//! Human-readable block messages.

use crate::checker::DenyReason;
use crate::config::HintConfig;

/// Message for `reason`, or `None` when hints are disabled.
pub fn render(config: &HintConfig, reason: &DenyReason) -> Option<String> {
    if !config.enabled {
        return None;
    }
    let text = match reason {
        DenyReason::Cooldown { remaining_secs } => {
            config.cooldown.replace("{seconds}", &remaining_secs.to_string())
        }
        DenyReason::QuotaExhausted { .. } => config.quota.clone(),
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> HintConfig {
        HintConfig { enabled: true, ..HintConfig::default() }
    }

    #[test]
    fn disabled_hints_render_nothing() {
        let reason = DenyReason::Cooldown { remaining_secs: 3 };
        assert_eq!(render(&HintConfig::default(), &reason), None);
    }

    #[test]
    fn cooldown_substitutes_seconds() {
        let config = HintConfig { cooldown: "wait {seconds}s ({seconds})".into(), ..enabled() };
        let reason = DenyReason::Cooldown { remaining_secs: 7 };
        assert_eq!(render(&config, &reason).as_deref(), Some("wait 7s (7)"));
    }

    #[test]
    fn quota_uses_template_verbatim() {
        let reason = DenyReason::QuotaExhausted { resets_at: 0 };
        assert_eq!(render(&enabled(), &reason), Some(HintConfig::default().quota));
    }
}
