use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use aes::cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7};
use reqwest::{
    Client, ClientBuilder, Response, Url,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use reqwest_cookie_store::CookieStoreMutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use super::error::ApiError;
use super::models::{
    ApiEnvelope, SearchCondition, SearchPage, SearchPageDto, VideoInfo, VideoInfoDto, VideoSummary,
};
use crate::auth::SessionCookies;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

// 站点前端 config.json 中 domainConfig 的加密参数
const DOMAIN_CONFIG_KEY: &[u8] = b"80bdbdbaf7494add99198960d715d41b";
const DOMAIN_CONFIG_IV: &[u8] = b"bdbaf7494add9919";

const CSRK_KEY_TTL: Duration = Duration::from_secs(1800);

// 携带会话 Cookie 的智慧课堂客户端
#[derive(Debug, Clone)]
pub struct SmartclassClient {
    inner: Client,
    base_url: Url,
    csrk_cache: Arc<Mutex<Option<(String, Instant)>>>,
}

impl SmartclassClient {
    // 用会话副本创建客户端
    pub fn from_session(session: &SessionCookies) -> Result<Self, ApiError> {
        let cookie_store = Arc::new(CookieStoreMutex::new(session.to_cookie_store()?));
        let inner = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .cookie_provider(cookie_store)
            .default_headers(Self::default_headers())
            .build()?;

        Ok(Self {
            inner,
            base_url: session.base_url().clone(),
            csrk_cache: Arc::new(Mutex::new(None)),
        })
    }

    pub fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36"));
        headers
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn get_checked(&self, url: Url) -> Result<Response, ApiError> {
        debug!("GET {}", url);
        let resp = self.inner.get(url.clone()).send().await.map_err(|e| {
            error!("请求失败: {}", e);
            e
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status, url.to_string()));
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let resp = self.get_checked(url).await?;
        let raw_body = resp.bytes().await?;
        parse_json_body(&raw_body)
    }

    /// 读取任意地址的原始内容（如分段索引文件）
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let url = Url::parse(url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))?;
        let resp = self.get_checked(url).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    pub async fn fetch_domain_config(&self) -> Result<Value, ApiError> {
        let config: Value = self.get_json(self.endpoint("config.json")?).await?;
        let encrypted = config
            .get("domainConfig")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::InvalidResponse("config.json 缺少 domainConfig".to_string()))?;
        decrypt_domain_config(encrypted)
    }

    // csrkKey 缓存半小时
    pub async fn csrk_key(&self) -> Result<String, ApiError> {
        {
            let cache = self.csrk_cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((key, fetched_at)) = cache.as_ref() {
                if fetched_at.elapsed() < CSRK_KEY_TTL {
                    return Ok(key.clone());
                }
            }
        }

        let domain_config = self.fetch_domain_config().await?;
        let key = domain_config
            .get("csrkKey")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("站点配置中没有 csrkKey".to_string()))?
            .to_string();

        let mut cache = self.csrk_cache.lock().unwrap_or_else(PoisonError::into_inner);
        *cache = Some((key.clone(), Instant::now()));
        Ok(key)
    }

    pub async fn csrk_token(&self) -> Result<String, ApiError> {
        let key = self.csrk_key().await?;
        csrk_token_from_key(&key, chrono::Utc::now().timestamp_millis())
    }

    /// 按编号获取录播信息
    ///
    /// 接口返回 `Success: false` 时为 [`ApiError::Rejected`]，
    /// 返回成功但没有内容时为 `Ok(None)`。
    pub async fn get_video_info_by_id(&self, video_id: &str) -> Result<Option<VideoInfo>, ApiError> {
        let token = self.csrk_token().await?;
        let mut url = self.endpoint("Video/GetVideoInfoDtoByID")?;
        let query = serde_urlencoded::to_string([("csrkToken", token.as_str()), ("NewId", video_id)])
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.set_query(Some(&query));

        let envelope: ApiEnvelope<VideoInfoDto> = self.get_json(url).await?;
        if !envelope.success {
            let message = envelope.message.unwrap_or_else(|| "未知错误".to_string());
            return Err(ApiError::Rejected(format!("获取视频信息失败: {}", message)));
        }
        envelope.value.map(VideoInfo::try_from).transpose()
    }

    /// 搜索当前账号可见的录播，返回一页结果
    pub async fn search_video(&self, condition: &SearchCondition) -> Result<SearchPage, ApiError> {
        let token = self.csrk_token().await?;
        let mut url = self.endpoint("Webapi/V1/Video/GetMyVideoList")?;
        let page_size = condition.page_size.to_string();
        let page_number = condition.page_number.to_string();
        let query = serde_urlencoded::to_string([
            ("csrkToken", token.as_str()),
            ("Sort", "StartTime"),
            ("Order", "0"),
            ("PageSize", page_size.as_str()),
            ("PageNumber", page_number.as_str()),
            ("StartDate", condition.start_date.as_str()),
            ("EndDate", condition.end_date.as_str()),
            ("TitleKey", condition.title_key.as_str()),
        ])
        .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.set_query(Some(&query));

        let envelope: ApiEnvelope<SearchPageDto> = self.get_json(url).await?;
        if !envelope.success {
            let message = envelope.message.unwrap_or_else(|| "未知错误".to_string());
            return Err(ApiError::Rejected(format!("搜索录播失败: {}", message)));
        }
        let page = envelope
            .value
            .ok_or_else(|| ApiError::InvalidResponse("搜索结果缺少 Value".to_string()))?;
        SearchPage::try_from(page)
    }

    /// 从第一页开始逐页搜索，直到取满 TotalCount 或遇到空页
    pub async fn search_video_all(
        &self,
        condition: &SearchCondition,
    ) -> Result<Vec<VideoSummary>, ApiError> {
        let mut condition = condition.clone();
        condition.page_number = 1;
        let mut videos = Vec::new();

        loop {
            let page = self.search_video(&condition).await?;
            debug!(
                "搜索第 {} 页: {} 条，共 {} 条",
                condition.page_number,
                page.videos.len(),
                page.total_count
            );
            let fetched = page.videos.len();
            videos.extend(page.videos);
            if fetched == 0 || videos.len() as u64 >= page.total_count {
                break;
            }
            condition.page_number += 1;
        }
        Ok(videos)
    }
}

// 去掉 UTF-8 BOM 后按 JSON 解析
fn parse_json_body<T: DeserializeOwned>(raw: &[u8]) -> Result<T, ApiError> {
    let body = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    serde_json::from_slice(body).map_err(|e| {
        let text = String::from_utf8_lossy(body);
        if text.contains("<!DOCTYPE html>") || text.contains("<html") {
            return ApiError::InvalidResponse("返回了 HTML 页面，可能是登录状态已失效".to_string());
        }
        ApiError::InvalidResponse(format!("JSON 解析失败: {}", e))
    })
}

/// 解密 config.json 中十六进制编码的 domainConfig（AES-256-CBC，PKCS7 填充）
pub fn decrypt_domain_config(encrypted_hex: &str) -> Result<Value, ApiError> {
    let data = hex::decode(encrypted_hex.trim())
        .map_err(|e| ApiError::Decrypt(format!("十六进制解码失败: {}", e)))?;
    let plain = Aes256CbcDec::new_from_slices(DOMAIN_CONFIG_KEY, DOMAIN_CONFIG_IV)
        .map_err(|e| ApiError::Decrypt(e.to_string()))?
        .decrypt_padded_vec_mut::<Pkcs7>(&data)
        .map_err(|_| ApiError::Decrypt("填充校验失败".to_string()))?;
    parse_json_body(&plain)
}

/// 用 csrkKey 生成请求令牌：时间戳的每一位数字 d 映射为 key 的第 d 个字符
pub fn csrk_token_from_key(key: &str, timestamp_millis: i64) -> Result<String, ApiError> {
    let chars: Vec<char> = key.chars().collect();
    timestamp_millis
        .to_string()
        .chars()
        .map(|digit| {
            digit
                .to_digit(10)
                .and_then(|d| chars.get(d as usize).copied())
                .ok_or_else(|| ApiError::InvalidResponse(format!("csrkKey 长度不足: {}", key)))
        })
        .collect()
}
