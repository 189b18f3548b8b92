// 身份提取
// 会话校验（Auth0/JWT）由前置网关完成，网关把通过校验的用户 id
// 注入 x-user-id 头转发进来；头缺失即未登录，进入练习模式

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// 已通过网关校验的用户
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

impl CurrentUser {
    /// 参与临时文件命名的用户标记，未登录时为 anon
    pub fn tag(user: &Option<CurrentUser>) -> String {
        match user {
            Some(CurrentUser(id)) => id.to_string(),
            None => "anon".to_string(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i64>().ok())
            .map(CurrentUser)
            .ok_or(AppError::Unauthenticated)
    }
}
