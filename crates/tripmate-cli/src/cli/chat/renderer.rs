//! Line rendering for chat messages, plan notices and the prompt.

use console::style;

use tripmate_types::chat::{ChatMessage, MessageKind};
use tripmate_types::plan::{PlanNotice, PlanNoticeKind, PlanWorkflowState};
use tripmate_types::realtime::{ConnectionState, PLAN_READY_SENTINEL};

use crate::cli::style::format_clock;

const CONTINUATION_INDENT: &str = "          ";

/// Render one message. The planner's ready sentinel is not shown; the loop
/// reports the plan list instead.
pub fn render_message(message: &ChatMessage, own: bool) -> Option<String> {
    if message.is_from_planner() && message.content.trim() == PLAN_READY_SENTINEL {
        return None;
    }

    let clock = format!("{:>5}", format_clock(message.created_at));
    let body = message.content.trim_end().replace('\n', &format!("\n{CONTINUATION_INDENT}"));

    let line = if message.is_from_planner() {
        format!(
            "  {} {} {}",
            style(clock).dim(),
            style("✈ Planner").magenta().bold(),
            style(body).magenta()
        )
    } else if message.effective_kind() == MessageKind::System {
        format!("  {} {}", style(clock).dim(), style(body).dim().italic())
    } else if own {
        format!(
            "  {} {} {}",
            style(clock).dim(),
            style("You").green().bold(),
            body
        )
    } else {
        format!(
            "  {} {} {}",
            style(clock).dim(),
            style(message.display_sender()).cyan().bold(),
            body
        )
    };
    Some(line)
}

pub fn render_notice(notice: &PlanNotice) -> String {
    let marker = match notice.kind {
        PlanNoticeKind::Error => style("!").red().bold(),
        PlanNoticeKind::TimedOut => style("!").yellow().bold(),
    };
    format!("  {marker} {}", notice.text)
}

/// Prompt showing connection state and an in-progress plan.
pub fn prompt(connection: ConnectionState, plan: PlanWorkflowState) -> String {
    let dot = match connection {
        ConnectionState::Connected => style("●").green(),
        ConnectionState::Connecting => style("◌").yellow(),
        ConnectionState::Disconnected => style("○").red(),
    };
    let planning = if plan == PlanWorkflowState::Generating {
        format!("{} ", style("[planning…]").magenta())
    } else {
        String::new()
    };
    format!("  {dot} {planning}{} ", style("You >").green().bold())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sender: &str, content: &str) -> ChatMessage {
        ChatMessage {
            id: Some(1),
            sender_user_id: sender.to_string(),
            sender_user_name: Some("민지".to_string()),
            content: content.to_string(),
            created_at: None,
            kind: MessageKind::User,
        }
    }

    #[test]
    fn ready_sentinel_is_hidden() {
        assert!(render_message(&message("PLANNER", "PLAN_READY"), false).is_none());
    }

    #[test]
    fn planner_chatter_is_labelled() {
        let line = render_message(&message("PLANNER", "일정을 만드는 중입니다"), false).unwrap();
        assert!(line.contains("Planner"));
        assert!(line.contains("일정을 만드는 중입니다"));
    }

    #[test]
    fn own_and_foreign_senders() {
        let own = render_message(&message("7", "안녕"), true).unwrap();
        assert!(own.contains("You"));
        assert!(!own.contains("민지"));

        let foreign = render_message(&message("8", "안녕"), false).unwrap();
        assert!(foreign.contains("민지"));
    }

    #[test]
    fn multiline_content_is_indented() {
        let line = render_message(&message("8", "첫째 날\n둘째 날"), false).unwrap();
        assert!(line.contains(&format!("\n{CONTINUATION_INDENT}둘째 날")));
    }

    #[test]
    fn prompt_flags_generation() {
        assert!(prompt(ConnectionState::Connected, PlanWorkflowState::Generating).contains("planning"));
        assert!(!prompt(ConnectionState::Connected, PlanWorkflowState::Ready).contains("planning"));
    }
}
