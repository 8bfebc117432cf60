use chrono::{TimeZone, Utc};

use crate::models::{
    CabinClass, DestinationInfo, FlightOption, LocationSnapshot, PlaceRecord, TransportOption,
};

pub(crate) fn flight(number: &str, price: f64) -> FlightOption {
    FlightOption {
        flight_number: number.to_string(),
        airline: "Test Air".to_string(),
        departure: Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap(),
        arrival: Utc.with_ymd_and_hms(2026, 5, 1, 20, 0, 0).unwrap(),
        price,
        cabin_class: CabinClass::Economy,
    }
}

pub(crate) fn sample_snapshot() -> LocationSnapshot {
    LocationSnapshot {
        destination: DestinationInfo {
            name: "Lisbon".to_string(),
            country: Some("Portugal".to_string()),
            timezone: None,
        },
        hotels: vec![
            PlaceRecord {
                category: Some("budget".to_string()),
                price_per_night: Some(60.0),
                ..PlaceRecord::named("Alfama Hostel")
            },
            PlaceRecord {
                category: Some("luxury".to_string()),
                price_per_night: Some(300.0),
                ..PlaceRecord::named("Avenida Palace")
            },
        ],
        restaurants: vec![
            PlaceRecord {
                price_level: Some(1),
                avg_price: Some(10.0),
                ..PlaceRecord::named("Tasca do Bairro")
            },
            PlaceRecord {
                price_level: Some(3),
                avg_price: Some(50.0),
                ..PlaceRecord::named("Belcanto")
            },
        ],
        activities: vec![
            PlaceRecord {
                price: Some(35.0),
                ..PlaceRecord::named("Fado Night")
            },
            PlaceRecord {
                price: Some(25.0),
                ..PlaceRecord::named("Tram 28 Tour")
            },
        ],
        attractions: vec![PlaceRecord::named("Belem Tower")],
        flights: Some(vec![
            flight("TP201", 600.0),
            flight("TP202", 500.0),
            flight("TP203", 900.0),
        ]),
        local_transport: vec![
            TransportOption {
                mode: "Public Transit".to_string(),
                price: 3.0,
                route: "City Center - Tourist Areas".to_string(),
            },
            TransportOption {
                mode: "Taxi/Rideshare".to_string(),
                price: 25.0,
                route: "Average city ride".to_string(),
            },
            TransportOption {
                mode: "Airport Transfer".to_string(),
                price: 40.0,
                route: "Airport to City Center".to_string(),
            },
        ],
    }
}
