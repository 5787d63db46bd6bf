//! Web dashboard with JSON API endpoints
//!
//! The page itself only renders snapshots; device settings are proxied
//! straight through to the receiver.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::device::DeviceApi;
use crate::reducer::AlarmState;
use crate::settings::{DeviceCommand, MqttConfig, RfParams, WlanConfig};
use crate::state::{ProbeView, StateHandle};
use crate::units::TemperatureUnit;
use crate::MonitorError;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub device: Arc<dyn DeviceApi>,
    pub unit: TemperatureUnit,
    /// How often the page re-fetches the snapshot
    pub refresh: Duration,
}

/// Build the dashboard axum router
pub fn build_router(
    state: StateHandle,
    device: Arc<dyn DeviceApi>,
    unit: TemperatureUnit,
    refresh: Duration,
) -> Router {
    let dashboard_state = DashboardState {
        state,
        device,
        unit,
        refresh,
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .route("/api/events", get(events_handler))
        .route("/api/wlan-config", get(get_wlan).post(set_wlan))
        .route("/api/mqtt-config", get(get_mqtt).post(set_mqtt))
        .route("/api/rf-params", get(get_rf).post(set_rf))
        .route("/api/pairing-status", get(get_pairing))
        .route("/api/cmd", post(send_command))
        .route("/health", get(health_handler))
        .with_state(dashboard_state)
}

/// Maps device errors onto HTTP status codes
struct ApiError(MonitorError);

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            MonitorError::InvalidValue(_) => StatusCode::BAD_REQUEST,
            MonitorError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        };
        tracing::debug!("Dashboard request failed with {}: {}", status, self.0);
        (status, self.0.to_string()).into_response()
    }
}

fn alarm_colors(state: AlarmState) -> (&'static str, &'static str) {
    match state {
        AlarmState::Normal => ("#155724", "#d4edda"),
        AlarmState::Over => ("#721c24", "#f8d7da"),
        AlarmState::Under => ("#0c5460", "#d1ecf1"),
        AlarmState::Unknown => ("#383d41", "#e2e3e5"),
    }
}

fn format_temp(value: Option<f64>, unit: TemperatureUnit) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}{}", v, unit.symbol()),
        _ => "--".to_string(),
    }
}

/// Inline SVG polyline; sensor faults break the line
fn sparkline(series: &[f64]) -> String {
    let finite: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return String::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };
    let step = 200.0 / (series.len() - 1) as f64;

    let mut segments: Vec<Vec<String>> = vec![Vec::new()];
    for (i, v) in series.iter().enumerate() {
        if v.is_finite() {
            let x = i as f64 * step;
            let y = 40.0 - (v - min) / span * 40.0;
            if let Some(segment) = segments.last_mut() {
                segment.push(format!("{:.1},{:.1}", x, y));
            }
        } else if segments.last().is_some_and(|s| !s.is_empty()) {
            segments.push(Vec::new());
        }
    }

    let lines: String = segments
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| {
            format!(
                r##"<polyline fill="none" stroke="#6c757d" stroke-width="1.5" points="{}"/>"##,
                s.join(" ")
            )
        })
        .collect();
    format!(r#"<svg width="200" height="40" viewBox="0 0 200 40">{}</svg>"#, lines)
}

fn probe_row(p: &ProbeView, unit: TemperatureUnit) -> String {
    let (color, bg) = alarm_colors(p.alarm_state);
    format!(
        r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">
                        <span style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: {}; background-color: {};">{}</span>
                    </td>
                    <td style="padding: 0.5rem;">{} / {}</td>
                    <td style="padding: 0.5rem;">{}</td>
                </tr>"#,
        p.probe_id,
        format_temp(p.current_temp, unit),
        color,
        bg,
        p.alarm_state,
        format_temp(p.alarm_min, unit),
        format_temp(p.alarm_max, unit),
        sparkline(&p.series)
    )
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let snapshot = dashboard.state.read().await.snapshot(dashboard.unit);

    let probe_rows: String = snapshot
        .probes
        .iter()
        .map(|p| probe_row(p, dashboard.unit))
        .collect();

    let (wifi, paired, billows) = match &snapshot.device {
        Some(d) => (
            if d.wifi_connected { "Connected" } else { "Disconnected" },
            if d.paired { "Paired" } else { "Not paired" },
            if d.billows_active { "On" } else { "Off" },
        ),
        None => ("--", "--", "--"),
    };

    let html = format!(
        r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Smoke X Monitor</title>
    <script>
        const colors = {{
            'normal': ['#155724', '#d4edda'],
            'over': ['#721c24', '#f8d7da'],
            'under': ['#0c5460', '#d1ecf1'],
        }};
        const labels = {{
            'normal': '{normal}',
            'over': '{over}',
            'under': '{under}',
            'unknown': '{unknown}',
        }};
        function fmt(v, unit) {{
            return v === null || v === undefined ? '--' : v.toFixed(1) + unit;
        }}
        function spark(series) {{
            const finite = series.filter(v => v !== null);
            if (finite.length < 2) return '';
            const min = Math.min(...finite), max = Math.max(...finite);
            const span = max > min ? max - min : 1;
            const step = 200 / (series.length - 1);
            const segments = [[]];
            series.forEach((v, i) => {{
                if (v === null) {{
                    if (segments[segments.length - 1].length) segments.push([]);
                    return;
                }}
                const y = 40 - (v - min) / span * 40;
                segments[segments.length - 1].push((i * step).toFixed(1) + ',' + y.toFixed(1));
            }});
            return '<svg width="200" height="40" viewBox="0 0 200 40">' + segments
                .filter(s => s.length)
                .map(s => '<polyline fill="none" stroke="#6c757d" stroke-width="1.5" points="' + s.join(' ') + '"/>')
                .join('') + '</svg>';
        }}
        function refreshData() {{
            fetch('/api/snapshot')
                .then(r => r.json())
                .then(data => {{
                    const unit = data.unit === 'celsius' ? '°C' : '°F';
                    document.getElementById('connectivity').textContent = data.connectivity;
                    if (data.device) {{
                        document.getElementById('wifi').textContent = data.device.wifi_connected ? 'Connected' : 'Disconnected';
                        document.getElementById('paired').textContent = data.device.paired ? 'Paired' : 'Not paired';
                        document.getElementById('billows').textContent = data.device.billows_active ? 'On' : 'Off';
                    }}
                    const tbody = document.getElementById('probe-body');
                    tbody.innerHTML = data.probes.map(p => {{
                        const [color, bg] = colors[p.alarm_state] || ['#383d41', '#e2e3e5'];
                        return `<tr style="border-bottom: 1px solid #dee2e6;">
                            <td style="padding: 0.5rem;">probe ${{p.probe_id}}</td>
                            <td style="padding: 0.5rem;">${{fmt(p.current_temp, unit)}}</td>
                            <td style="padding: 0.5rem;">
                                <span style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: ${{color}}; background-color: ${{bg}};">${{labels[p.alarm_state]}}</span>
                            </td>
                            <td style="padding: 0.5rem;">${{fmt(p.alarm_min, unit)}} / ${{fmt(p.alarm_max, unit)}}</td>
                            <td style="padding: 0.5rem;">${{spark(p.series)}}</td>
                        </tr>`;
                    }}).join('');
                }});
        }}
        setInterval(refreshData, {refresh_ms});
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>Smoke X Monitor</h1>
    <section>
        <p>Receiver: <strong id="connectivity">{connectivity}</strong>
            &middot; WiFi: <span id="wifi">{wifi}</span>
            &middot; <span id="paired">{paired}</span>
            &middot; Billows: <span id="billows">{billows}</span></p>
    </section>
    <section>
        <h2>Probes</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Probe</th>
                    <th style="padding: 0.5rem; text-align: left;">Temperature</th>
                    <th style="padding: 0.5rem; text-align: left;">Alarm</th>
                    <th style="padding: 0.5rem; text-align: left;">Min / Max</th>
                    <th style="padding: 0.5rem; text-align: left;">History</th>
                </tr>
            </thead>
            <tbody id="probe-body">{probe_rows}</tbody>
        </table>
    </section>
</body>
</html>"##,
        connectivity = snapshot.connectivity,
        wifi = wifi,
        paired = paired,
        billows = billows,
        probe_rows = probe_rows,
        refresh_ms = dashboard.refresh.as_millis(),
        normal = AlarmState::Normal,
        over = AlarmState::Over,
        under = AlarmState::Under,
        unknown = AlarmState::Unknown,
    );

    Html(html)
}

async fn snapshot_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let snapshot = dashboard.state.read().await.snapshot(dashboard.unit);
    Json(snapshot)
}

async fn events_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    let events: Vec<_> = state.events.iter().cloned().collect();
    Json(events)
}

async fn get_wlan(State(dashboard): State<DashboardState>) -> Result<Json<WlanConfig>, ApiError> {
    Ok(Json(dashboard.device.wlan_config().await?))
}

async fn set_wlan(
    State(dashboard): State<DashboardState>,
    Json(config): Json<WlanConfig>,
) -> Result<StatusCode, ApiError> {
    dashboard.device.set_wlan_config(&config).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_mqtt(State(dashboard): State<DashboardState>) -> Result<Json<MqttConfig>, ApiError> {
    Ok(Json(dashboard.device.mqtt_config().await?))
}

async fn set_mqtt(
    State(dashboard): State<DashboardState>,
    Json(config): Json<MqttConfig>,
) -> Result<StatusCode, ApiError> {
    dashboard.device.set_mqtt_config(&config).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_rf(State(dashboard): State<DashboardState>) -> Result<Json<RfParams>, ApiError> {
    Ok(Json(dashboard.device.rf_params().await?))
}

async fn set_rf(
    State(dashboard): State<DashboardState>,
    Json(params): Json<RfParams>,
) -> Result<StatusCode, ApiError> {
    dashboard.device.set_rf_params(&params).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_pairing(State(dashboard): State<DashboardState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(dashboard.device.pairing_status().await?))
}

async fn send_command(
    State(dashboard): State<DashboardState>,
    Json(command): Json<DeviceCommand>,
) -> Result<StatusCode, ApiError> {
    dashboard.device.send_command(&command).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
