use chrono::Local;
use weather_core::{Icon, WeatherReading, WeatherState};

pub fn state(state: &WeatherState, icon: Option<&Icon>) -> String {
    let mut out = match (&state.reading, &state.error_message) {
        (Some(reading), _) => reading_block(reading),
        (None, Some(message)) => format!("Error: {message}\n"),
        (None, None) => "No weather to show. Try `weather show <city>`.\n".to_string(),
    };

    if let (Some(reading), Some(icon)) = (&state.reading, icon) {
        let (w, h) = icon.dimensions();
        let code = reading.icon_code().unwrap_or("?");
        out.push_str(&format!("Icon:       {code} ({w}x{h} px)\n"));
    }

    if let Some(at) = state.updated_at {
        let local = at.with_timezone(&Local);
        out.push_str(&format!("Updated:    {}\n", local.format("%Y-%m-%d %H:%M")));
    }

    out
}

fn reading_block(reading: &WeatherReading) -> String {
    format!(
        "{}, {}\n\
         Temp:       {:.0}°F (feels like {:.0}°F)\n\
         Conditions: {}\n\
         Humidity:   {}%\n",
        reading.name,
        reading.country,
        reading.temperature_f,
        reading.feels_like_f,
        reading.summary(),
        reading.humidity_pct,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::Condition;

    fn new_york() -> WeatherReading {
        WeatherReading {
            id: 1,
            name: "New York".into(),
            country: "US".into(),
            temperature_f: 72.4,
            feels_like_f: 70.0,
            humidity_pct: 55,
            conditions: vec![Condition {
                code: 800,
                category: "Clear".into(),
                description: "clear sky".into(),
                icon: "01d".into(),
            }],
        }
    }

    #[test]
    fn renders_reading() {
        let st = WeatherState { reading: Some(new_york()), ..Default::default() };
        let out = state(&st, None);

        assert!(out.starts_with("New York, US\n"));
        assert!(out.contains("72°F (feels like 70°F)"));
        assert!(out.contains("Clear Sky"));
        assert!(out.contains("Humidity:   55%"));
    }

    #[test]
    fn renders_error() {
        let st = WeatherState {
            error_message: Some("Please enter a city name.".into()),
            ..Default::default()
        };

        assert_eq!(state(&st, None), "Error: Please enter a city name.\n");
    }
}
