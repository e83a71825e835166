use cookie::Cookie;
use cookie_store::CookieStore;
use url::Url;
use tracing::debug;

use super::errors::{Result, SessionError};

pub const DEFAULT_BASE_URL: &str = "https://njupt.smartclass.cn/";

/// 已登录会话的 Cookie 副本
///
/// 任务在工作协程上执行，拿不到界面持有的会话对象，
/// 因此提交索引任务时把站点地址和 Cookie 一起拷贝进任务。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookies {
    base_url: Url,
    cookies: Vec<(String, String)>,
}

impl SessionCookies {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| SessionError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SessionError::InvalidUrl(base_url.to_string()));
        }
        // 保证以 / 结尾，后续 join 才不会吃掉最后一段路径
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            cookies: Vec::new(),
        })
    }

    /// 从 `Cookie:` 请求头格式的字符串解析，如 `JSESSIONID=abc; token=xyz`
    pub fn from_cookie_header(base_url: &str, header: &str) -> Result<Self> {
        let mut session = Self::new(base_url)?;
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| SessionError::InvalidCookie(pair.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(SessionError::InvalidCookie(pair.to_string()));
            }
            session = session.with_cookie(name, value.trim());
        }
        Ok(session)
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.cookies.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.cookies.push((name, value)),
        }
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    // 构建客户端使用的 CookieStore，Cookie 只绑定到站点主机
    pub fn to_cookie_store(&self) -> Result<CookieStore> {
        let mut store = CookieStore::default();
        for (name, value) in &self.cookies {
            let cookie = Cookie::build((name.clone(), value.clone())).path("/").build();
            store
                .insert_raw(&cookie, &self.base_url)
                .map_err(|e| SessionError::InvalidCookie(format!("{}: {}", name, e)))?;
        }
        debug!("已载入 {} 个 Cookie", self.cookies.len());
        Ok(store)
    }
}
