use chrono::NaiveDateTime;
use serde::Deserialize;

use super::error::ApiError;

// 接口统一的外层结构，Message / Value 缺失或为 null 时都是 None
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "Message")]
    pub message: Option<String>,
    #[serde(rename = "Value")]
    pub value: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct VideoInfoDto {
    #[serde(rename = "NewID")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "StartTime")]
    pub start_time: String,
    #[serde(rename = "StopTime")]
    pub stop_time: String,
    #[serde(rename = "CourseName")]
    pub course_name: String,
    #[serde(rename = "VideoSegmentInfo")]
    pub segments: Vec<VideoSegmentDto>,
}

#[derive(Debug, Deserialize)]
pub struct VideoSegmentDto {
    #[serde(rename = "IndexFileUri")]
    pub index_file_uri: String,
}

// 接口返回的时间为北京时间，不带时区
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_time(text: &str) -> Result<NaiveDateTime, ApiError> {
    NaiveDateTime::parse_from_str(text, TIME_FORMAT)
        .map_err(|e| ApiError::InvalidResponse(format!("时间格式错误 {}: {}", text, e)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSegment {
    pub index_file_uri: String,
}

/// 一次录播的基本信息，可能由多个分段组成
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub start_time: NaiveDateTime,
    pub stop_time: NaiveDateTime,
    pub course_name: String,
    pub segments: Vec<VideoSegment>,
}

impl TryFrom<VideoInfoDto> for VideoInfo {
    type Error = ApiError;

    fn try_from(dto: VideoInfoDto) -> Result<Self, Self::Error> {
        Ok(Self {
            start_time: parse_time(&dto.start_time)?,
            stop_time: parse_time(&dto.stop_time)?,
            id: dto.id,
            title: dto.title,
            course_name: dto.course_name,
            segments: dto
                .segments
                .into_iter()
                .map(|segment| VideoSegment {
                    index_file_uri: segment.index_file_uri,
                })
                .collect(),
        })
    }
}

// 录播搜索 ---------------------------------------------------------------

/// 搜索条件，日期格式为 `YYYY-MM-DD`，空字符串表示不限
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCondition {
    pub title_key: String,
    pub start_date: String,
    pub end_date: String,
    pub page_size: u32,
    pub page_number: u32,
}

impl Default for SearchCondition {
    fn default() -> Self {
        Self {
            title_key: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            page_size: 12,
            page_number: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchPageDto {
    #[serde(rename = "Data")]
    pub data: Vec<VideoSummaryDto>,
    #[serde(rename = "TotalCount")]
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct VideoSummaryDto {
    #[serde(rename = "NewID")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "StartTime")]
    pub start_time: String,
    #[serde(rename = "StopTime")]
    pub stop_time: String,
    #[serde(rename = "CourseName")]
    pub course_name: String,
    #[serde(rename = "Teachers", default)]
    pub teachers: Option<String>,
    #[serde(rename = "ClassRoomName", default)]
    pub classroom_name: Option<String>,
}

/// 搜索结果中的一条录播
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub start_time: NaiveDateTime,
    pub stop_time: NaiveDateTime,
    pub course_name: String,
    pub teachers: String,
    pub classroom_name: String,
}

impl TryFrom<VideoSummaryDto> for VideoSummary {
    type Error = ApiError;

    fn try_from(dto: VideoSummaryDto) -> Result<Self, Self::Error> {
        Ok(Self {
            start_time: parse_time(&dto.start_time)?,
            stop_time: parse_time(&dto.stop_time)?,
            id: dto.id,
            title: dto.title,
            course_name: dto.course_name,
            teachers: dto.teachers.unwrap_or_default(),
            classroom_name: dto.classroom_name.unwrap_or_default(),
        })
    }
}

/// 一页搜索结果和符合条件的总数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub total_count: u64,
    pub videos: Vec<VideoSummary>,
}

impl TryFrom<SearchPageDto> for SearchPage {
    type Error = ApiError;

    fn try_from(dto: SearchPageDto) -> Result<Self, Self::Error> {
        Ok(Self {
            total_count: dto.total_count,
            videos: dto
                .data
                .into_iter()
                .map(VideoSummary::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_null_value_is_none() {
        let missing: ApiEnvelope<VideoInfoDto> =
            serde_json::from_str(r#"{"Success":true}"#).unwrap();
        assert!(missing.success);
        assert!(missing.value.is_none());
        assert!(missing.message.is_none());

        let null: ApiEnvelope<VideoInfoDto> =
            serde_json::from_str(r#"{"Success":false,"Message":"无权限","Value":null}"#).unwrap();
        assert!(!null.success);
        assert!(null.value.is_none());
        assert_eq!(null.message.as_deref(), Some("无权限"));
    }

    #[test]
    fn search_page_converts_summaries() {
        let page: ApiEnvelope<SearchPageDto> = serde_json::from_str(
            r#"{"Success":true,"Value":{"TotalCount":1,"Data":[{
                "NewID":"v1","Title":"第一讲","StartTime":"2024-03-01 08:00:00",
                "StopTime":"2024-03-01 09:35:00","CourseName":"电路分析",
                "Teachers":"张老师","ClassRoomName":null,"Cover":"x.jpg"}]}}"#,
        )
        .unwrap();
        let page = SearchPage::try_from(page.value.unwrap()).unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.videos[0].course_name, "电路分析");
        assert_eq!(page.videos[0].teachers, "张老师");
        assert_eq!(page.videos[0].classroom_name, "");
    }

    #[test]
    fn search_page_without_total_is_rejected() {
        let result: Result<ApiEnvelope<SearchPageDto>, _> =
            serde_json::from_str(r#"{"Success":true,"Value":{"Data":[]}}"#);
        assert!(result.is_err());
    }
}
