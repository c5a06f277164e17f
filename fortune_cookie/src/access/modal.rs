//! Denial modal content handed to the UI.

use std::fmt;

/// Control offered on a denial modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    Reload,
    ViewHistory,
    GoHome,
    RetryLogin,
}

impl ModalAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reload => "새로고침",
            Self::ViewHistory => "지난 운세 보기",
            Self::GoHome => "홈으로",
            Self::RetryLogin => "다시 로그인",
        }
    }
}

/// Why the gate said no, with everything needed to render it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialModal {
    /// Backend answered with a non-policy error status
    ServerUnavailable,
    /// School has no service period configured
    PeriodNotConfigured { school: String },
    /// Today's use is spent; `next_available_at` drives the countdown
    DailyLimit { next_available_at: Option<String> },
    /// Request never got an answer
    ConnectionError,
    /// Response could not be understood
    ClientError { detail: String },
    LoginRequired,
}

impl DenialModal {
    pub fn title(&self) -> &'static str {
        match self {
            Self::ServerUnavailable => "서버 연결 실패",
            Self::PeriodNotConfigured { .. } => "이용 기간 미설정",
            Self::DailyLimit { .. } => "오늘의 이용 완료",
            Self::ConnectionError => "네트워크 오류",
            Self::ClientError { .. } => "오류 발생",
            Self::LoginRequired => "로그인 필요",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::ServerUnavailable => {
                "서버에 연결할 수 없습니다. 잠시 후 다시 시도해 주세요.".to_string()
            }
            Self::PeriodNotConfigured { school } => {
                format!("{school}의 서비스 이용 기간이 아직 설정되지 않았습니다.")
            }
            Self::DailyLimit { .. } => {
                "오늘은 이미 포춘쿠키를 열었어요. 다음 이용 시간까지 기다려 주세요.".to_string()
            }
            Self::ConnectionError => "네트워크 연결을 확인한 뒤 다시 시도해 주세요.".to_string(),
            Self::ClientError { detail } => format!("요청을 처리하지 못했습니다: {detail}"),
            Self::LoginRequired => "로그인이 필요합니다.".to_string(),
        }
    }

    pub fn action(&self) -> ModalAction {
        match self {
            Self::ServerUnavailable | Self::ConnectionError | Self::ClientError { .. } => {
                ModalAction::Reload
            }
            Self::PeriodNotConfigured { .. } => ModalAction::GoHome,
            Self::DailyLimit { .. } => ModalAction::ViewHistory,
            Self::LoginRequired => ModalAction::RetryLogin,
        }
    }
}

impl fmt::Display for DenialModal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.title(), self.message(), self.action().label())
    }
}
