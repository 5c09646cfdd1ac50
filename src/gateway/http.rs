//! HTTP gateway backed by OpenWeatherMap, the Wikipedia REST API and NewsAPI

use super::{GatewayService, KnowledgeGateway};
use crate::{GatewayConfig, ParleyError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const NEWSAPI_URL: &str = "https://newsapi.org/v2/top-headlines";
/// Wikipedia extracts longer than this are cut and suffixed with "..."
const SUMMARY_MAX_CHARS: usize = 400;
const MAX_HEADLINES: usize = 3;

const WEATHER_KEY_MISSING: &str = "I need a weather API key to provide live weather data. \
You can get one from https://openweathermap.org and set OPENWEATHER_API_KEY.";
const NEWS_KEY_MISSING: &str = "📰 To get news headlines, please get a free API key from \
https://newsapi.org and set NEWS_API_KEY.";

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    weather: Vec<WeatherCondition>,
    main: WeatherMain,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WikiSummary {
    #[serde(default)]
    extract: String,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsArticle {
    #[serde(default)]
    title: Option<String>,
}

/// Gateway that calls public web APIs
pub struct HttpGateway {
    client: Client,
    weather_api_key: Option<String>,
    news_api_key: Option<String>,
    wikipedia_language: String,
    news_country: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            weather_api_key: config.weather_api_key.clone().filter(|k| !k.is_empty()),
            news_api_key: config.news_api_key.clone().filter(|k| !k.is_empty()),
            wikipedia_language: config.wikipedia_language.clone(),
            news_country: config.news_country.clone(),
        })
    }

    async fn fetch_weather(&self, location: &str, api_key: &str) -> Result<String> {
        let response = self
            .client
            .get(OPENWEATHER_URL)
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            debug!("Weather lookup for {} returned {}", location, response.status());
            return Ok(format!(
                "❌ Sorry, I couldn't fetch weather for {}. Please check the city name.",
                location
            ));
        }
        let data: WeatherResponse = response.json().await?;
        Ok(format_weather(location, &data))
    }

    fn summary_url(&self, topic: &str) -> Result<Url> {
        let base = format!(
            "https://{}.wikipedia.org/api/rest_v1/page/summary/",
            self.wikipedia_language
        );
        let mut url = Url::parse(&base)
            .map_err(|e| ParleyError::Config(format!("invalid wikipedia url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ParleyError::Config("wikipedia url cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&topic.replace(' ', "_"));
        Ok(url)
    }

    async fn fetch_summary(&self, topic: &str) -> Result<String> {
        let url = self.summary_url(topic)?;
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(not_found_message(topic));
        }
        let response = response.error_for_status()?;
        let data: WikiSummary = response.json().await?;
        Ok(format_summary(topic, &data.extract))
    }

    async fn fetch_news(&self, category: &str, api_key: &str) -> Result<String> {
        let response = self
            .client
            .get(NEWSAPI_URL)
            .query(&[
                ("category", category),
                ("country", self.news_country.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            debug!("News lookup for {} returned {}", category, response.status());
            return Ok("❌ Sorry, I couldn't fetch news headlines at the moment.".to_string());
        }
        let data: NewsResponse = response.json().await?;
        Ok(format_headlines(&data))
    }
}

#[async_trait]
impl KnowledgeGateway for HttpGateway {
    async fn weather(&self, location: &str) -> String {
        let Some(api_key) = self.weather_api_key.as_deref() else {
            return WEATHER_KEY_MISSING.to_string();
        };
        match self.fetch_weather(location, api_key).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Weather request failed: {}", e);
                GatewayService::Weather.unavailable_message().to_string()
            }
        }
    }

    async fn wikipedia_summary(&self, topic: &str) -> String {
        match self.fetch_summary(topic).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Wikipedia request failed: {}", e);
                GatewayService::Wikipedia.unavailable_message().to_string()
            }
        }
    }

    async fn news_headlines(&self, category: &str) -> String {
        let Some(api_key) = self.news_api_key.as_deref() else {
            return NEWS_KEY_MISSING.to_string();
        };
        match self.fetch_news(category, api_key).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("News request failed: {}", e);
                GatewayService::News.unavailable_message().to_string()
            }
        }
    }
}

fn format_weather(location: &str, data: &WeatherResponse) -> String {
    let description = data
        .weather
        .first()
        .map(|w| crate::memory::title_case(&w.description))
        .unwrap_or_else(|| "Unknown".to_string());
    format!(
        "🌤️ Weather in {}: {}, Temperature: {:.1}°C, Humidity: {}%",
        location, description, data.main.temp, data.main.humidity
    )
}

fn not_found_message(topic: &str) -> String {
    format!("❌ I couldn't find information about '{}' on Wikipedia.", topic)
}

fn format_summary(topic: &str, extract: &str) -> String {
    let extract = extract.trim();
    if extract.is_empty() {
        return not_found_message(topic);
    }
    let summary = if extract.chars().count() > SUMMARY_MAX_CHARS {
        let cut: String = extract.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{}...", cut)
    } else {
        extract.to_string()
    };
    format!("📚 Wikipedia: {}", summary)
}

fn format_headlines(data: &NewsResponse) -> String {
    let headlines: Vec<&str> = data
        .articles
        .iter()
        .filter_map(|a| a.title.as_deref())
        .filter(|t| !t.trim().is_empty())
        .take(MAX_HEADLINES)
        .collect();
    if headlines.is_empty() {
        return "📰 No headlines available right now.".to_string();
    }
    format!("📰 Top News:\n• {}", headlines.join("\n• "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_weather() {
        let data: WeatherResponse = serde_json::from_str(
            r#"{"weather":[{"description":"light rain"}],"main":{"temp":12.5,"humidity":81}}"#,
        )
        .unwrap();
        assert_eq!(
            format_weather("Tokyo", &data),
            "🌤️ Weather in Tokyo: Light Rain, Temperature: 12.5°C, Humidity: 81%"
        );
    }

    #[test]
    fn test_format_weather_whole_degrees_keep_one_decimal() {
        let data: WeatherResponse = serde_json::from_str(
            r#"{"weather":[{"description":"clear sky"}],"main":{"temp":20,"humidity":40}}"#,
        )
        .unwrap();
        assert_eq!(
            format_weather("Oslo", &data),
            "🌤️ Weather in Oslo: Clear Sky, Temperature: 20.0°C, Humidity: 40%"
        );
    }

    #[test]
    fn test_format_summary_truncates_on_char_boundary() {
        let long = "é".repeat(SUMMARY_MAX_CHARS + 10);
        let out = format_summary("Accents", &long);
        assert!(out.starts_with("📚 Wikipedia: "));
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().filter(|c| *c == 'é').count(), SUMMARY_MAX_CHARS);

        assert_eq!(format_summary("Rust", "A language."), "📚 Wikipedia: A language.");
        assert_eq!(format_summary("Nothing", "  "), not_found_message("Nothing"));
    }

    #[test]
    fn test_format_headlines_takes_three() {
        let data: NewsResponse = serde_json::from_str(
            r#"{"articles":[{"title":"A"},{"title":null},{"title":"B"},{"title":"C"},{"title":"D"}]}"#,
        )
        .unwrap();
        assert_eq!(format_headlines(&data), "📰 Top News:\n• A\n• B\n• C");

        let empty = NewsResponse { articles: vec![] };
        assert!(format_headlines(&empty).contains("No headlines"));
    }

    #[test]
    fn test_summary_url_encodes_topic() {
        let gateway = HttpGateway::new(&GatewayConfig::default()).unwrap();
        let url = gateway.summary_url("Artificial Intelligence").unwrap();
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/Artificial_Intelligence"
        );
        let url = gateway.summary_url("C/C++").unwrap();
        assert!(url.as_str().contains("/summary/C%2FC"));
    }

    #[tokio::test]
    async fn test_missing_keys_explain_setup() {
        let gateway = HttpGateway::new(&GatewayConfig::default()).unwrap();
        assert!(gateway.weather("London").await.contains("OPENWEATHER_API_KEY"));
        assert!(gateway.news_headlines("general").await.contains("NEWS_API_KEY"));
    }
}
