use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use common::{AccountSnapshot, BrokerClient, Error, Order, Position, Result};

/// REST client for the Alpaca trading and market-data APIs.
/// Authenticates with plain key headers; the same credentials work against
/// the live and paper endpoints, selected via `base_url`.
pub struct AlpacaClient {
    api_key_id: String,
    api_secret_key: String,
    base_url: String,
    data_url: String,
    http: Client,
}

impl AlpacaClient {
    pub fn new(
        api_key_id: impl Into<String>,
        api_secret_key: impl Into<String>,
        base_url: impl Into<String>,
        data_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key_id: api_key_id.into(),
            api_secret_key: api_secret_key.into(),
            base_url: base_url.into(),
            data_url: data_url.into(),
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("APCA-API-KEY-ID", &self.api_key_id)
            .header("APCA-API-SECRET-KEY", &self.api_secret_key)
    }

    async fn get(&self, url: &str) -> Result<String> {
        let resp = self
            .authed(self.http.get(url))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Broker(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }

    async fn bars(&self, symbol: &str, query: &str) -> Result<f64> {
        let url = format!("{}/v2/stocks/{symbol}/bars?{query}", self.data_url);
        let body = self.get(&url).await?;
        let resp: BarsResponse =
            serde_json::from_str(&body).map_err(|e| Error::Broker(e.to_string()))?;
        resp.bars
            .and_then(|bars| bars.last().map(|b| b.close))
            .ok_or_else(|| Error::Broker(format!("No bars returned for {symbol}")))
    }
}

#[async_trait]
impl BrokerClient for AlpacaClient {
    async fn market_open(&self) -> Result<bool> {
        let body = self.get(&format!("{}/v2/clock", self.base_url)).await?;
        let clock: ClockResponse =
            serde_json::from_str(&body).map_err(|e| Error::Broker(e.to_string()))?;
        Ok(clock.is_open)
    }

    async fn account(&self) -> Result<AccountSnapshot> {
        let body = self.get(&format!("{}/v2/account", self.base_url)).await?;
        let account: AccountResponse =
            serde_json::from_str(&body).map_err(|e| Error::Broker(e.to_string()))?;
        let buying_power = account
            .buying_power
            .parse::<f64>()
            .map_err(|e| Error::Broker(format!("Bad buying_power: {e}")))?;
        Ok(AccountSnapshot {
            buying_power,
            trading_blocked: account.trading_blocked,
        })
    }

    async fn latest_close(&self, symbol: &str) -> Result<f64> {
        self.bars(symbol, "timeframe=1Day&limit=1").await
    }

    async fn close_on(&self, symbol: &str, date: NaiveDate) -> Result<f64> {
        self.bars(
            symbol,
            &format!("timeframe=1Day&start={date}&end={date}&limit=1"),
        )
        .await
    }

    async fn submit_order(&self, order: &Order) -> Result<()> {
        debug!(symbol = %order.symbol, side = %order.side, "Submitting order to Alpaca");
        let payload = json!({
            "symbol": order.symbol,
            "qty": order.quantity.to_string(),
            "side": order.side.to_string(),
            "type": "market",
            "time_in_force": "day",
            "client_order_id": order.id,
        });

        let resp = self
            .authed(self.http.post(format!("{}/v2/orders", self.base_url)))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
            return Err(Error::Broker(format!("HTTP {status}: {body}")));
        }
        Ok(())
    }

    async fn position(&self, symbol: &str) -> Result<Option<Position>> {
        let url = format!("{}/v2/positions/{symbol}", self.base_url);
        let resp = self
            .authed(self.http.get(&url))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        // Alpaca reports "no open position" as a 404
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Broker(format!("HTTP {status}: {body}")));
        }

        let pos: PositionResponse =
            serde_json::from_str(&body).map_err(|e| Error::Broker(e.to_string()))?;
        Ok(Some(Position {
            symbol: pos.symbol,
            quantity: pos
                .qty
                .parse::<f64>()
                .map_err(|e| Error::Broker(format!("Bad qty: {e}")))?,
            avg_entry_price: pos
                .avg_entry_price
                .parse::<f64>()
                .map_err(|e| Error::Broker(format!("Bad avg_entry_price: {e}")))?,
        }))
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ClockResponse {
    is_open: bool,
}

#[derive(Deserialize)]
struct AccountResponse {
    buying_power: String,
    trading_blocked: bool,
}

#[derive(Deserialize)]
struct BarsResponse {
    // null (not an empty array) when the range holds no trading days
    bars: Option<Vec<Bar>>,
}

#[derive(Deserialize)]
struct Bar {
    #[serde(rename = "c")]
    close: f64,
}

#[derive(Deserialize)]
struct PositionResponse {
    symbol: String,
    qty: String,
    avg_entry_price: String,
}
