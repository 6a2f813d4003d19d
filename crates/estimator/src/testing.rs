//! Synthetic housing fixtures shared by unit tests, integration tests and benches.

use crate::record::Record;

/// One CSV row of the housing dataset, kept as raw strings so tests can
/// corrupt individual cells.
#[derive(Debug, Clone)]
pub struct SampleRow {
    pub id: String,
    pub state: String,
    pub city: String,
    pub locality: String,
    pub property_type: String,
    pub bhk: String,
    pub size: String,
    pub target: String,
    pub price_per_sqft: String,
    pub year_built: String,
    pub furnished: String,
    pub floor_no: String,
    pub total_floors: String,
    pub age: String,
    pub schools: String,
    pub hospitals: String,
    pub transport: String,
    pub parking: String,
    pub security: String,
    pub amenities: String,
    pub facing: String,
    pub owner: String,
    pub availability: String,
}

pub const HOUSING_HEADER: &str = "ID,State,City,Locality,Property_Type,BHK,Size_in_SqFt,\
Price_in_Lakhs,Price_per_SqFt,Year_Built,Furnished_Status,Floor_No,Total_Floors,\
Age_of_Property,Nearby_Schools,Nearby_Hospitals,Public_Transport_Accessibility,\
Parking_Space,Security,Amenities,Facing,Owner_Type,Availability_Status";

impl SampleRow {
    /// The reference query row: a 2 BHK, 1200 sq ft apartment in MH.
    pub fn reference() -> Self {
        Self {
            id: "1".into(),
            state: "MH".into(),
            city: "Mumbai".into(),
            locality: "Locality_1".into(),
            property_type: "Apartment".into(),
            bhk: "2".into(),
            size: "1200".into(),
            target: "120.0".into(),
            price_per_sqft: "0.1".into(),
            year_built: "2010".into(),
            furnished: "Yes".into(),
            floor_no: "2".into(),
            total_floors: "10".into(),
            age: "10".into(),
            schools: "5".into(),
            hospitals: "3".into(),
            transport: "High".into(),
            parking: "Yes".into(),
            security: "Yes".into(),
            amenities: "\"Gym, Pool\"".into(),
            facing: "North".into(),
            owner: "Owner".into(),
            availability: "Available".into(),
        }
    }

    fn to_csv_line(&self) -> String {
        [
            &self.id,
            &self.state,
            &self.city,
            &self.locality,
            &self.property_type,
            &self.bhk,
            &self.size,
            &self.target,
            &self.price_per_sqft,
            &self.year_built,
            &self.furnished,
            &self.floor_no,
            &self.total_floors,
            &self.age,
            &self.schools,
            &self.hospitals,
            &self.transport,
            &self.parking,
            &self.security,
            &self.amenities,
            &self.facing,
            &self.owner,
            &self.availability,
        ]
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(",")
    }

    /// The model-input fields of this row as a prediction record.
    ///
    /// Panics if a numeric cell does not parse; only meant for fixtures.
    pub fn to_record(&self) -> Record {
        let num = |s: &str| s.parse::<f64>().expect("fixture numeric cell");
        Record::new()
            .with("BHK", num(&self.bhk))
            .with("Size_in_SqFt", num(&self.size))
            .with("Year_Built", num(&self.year_built))
            .with("Floor_No", num(&self.floor_no))
            .with("Total_Floors", num(&self.total_floors))
            .with("Age_of_Property", num(&self.age))
            .with("Nearby_Schools", num(&self.schools))
            .with("Nearby_Hospitals", num(&self.hospitals))
            .with("State", self.state.as_str())
            .with("Property_Type", self.property_type.as_str())
            .with("Furnished_Status", self.furnished.as_str())
            .with("Public_Transport_Accessibility", self.transport.as_str())
            .with("Parking_Space", self.parking.as_str())
            .with("Security", self.security.as_str())
            .with("Availability_Status", self.availability.as_str())
    }
}

/// Render rows as a headered CSV document.
pub fn housing_csv(rows: &[SampleRow]) -> String {
    let mut out = String::from(HOUSING_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&row.to_csv_line());
        out.push('\n');
    }
    out
}

/// Deterministic synthetic dataset of 40 rows; row 0 is [`SampleRow::reference`].
pub fn sample_rows() -> Vec<SampleRow> {
    const STATES: [&str; 4] = ["MH", "KA", "DL", "TN"];
    const TYPES: [&str; 3] = ["Apartment", "Villa", "Independent House"];
    const FURNISHED: [&str; 3] = ["Furnished", "Semi-furnished", "Unfurnished"];
    const TRANSPORT: [&str; 3] = ["Low", "Medium", "High"];

    let mut rows = vec![SampleRow::reference()];
    for i in 1..40usize {
        let bhk = 1 + i % 6;
        let size = 500 + (i * 137) % 5500;
        let year = 1980 + (i * 7) % 45;
        let total_floors = 1 + (i * 3) % 40;
        let floor = (i * 5) % (total_floors + 1);
        let age = 2024 - year;
        let kind = TYPES[i % TYPES.len()];
        let type_premium = match kind {
            "Villa" => 80.0,
            "Independent House" => 40.0,
            _ => 0.0,
        };
        let price = 20.0 + size as f64 * 0.08 + bhk as f64 * 12.5 + type_premium
            - age as f64 * 0.4;

        rows.push(SampleRow {
            id: (i + 1).to_string(),
            state: STATES[i % STATES.len()].into(),
            city: format!("City_{}", i % 5),
            locality: format!("Locality_{i}"),
            property_type: kind.into(),
            bhk: bhk.to_string(),
            size: size.to_string(),
            target: format!("{price:.2}"),
            price_per_sqft: format!("{:.4}", price / size as f64),
            year_built: year.to_string(),
            furnished: FURNISHED[i % FURNISHED.len()].into(),
            floor_no: floor.to_string(),
            total_floors: total_floors.to_string(),
            age: age.to_string(),
            schools: (i % 21).to_string(),
            hospitals: ((i * 2) % 21).to_string(),
            transport: TRANSPORT[i % TRANSPORT.len()].into(),
            parking: if i % 2 == 0 { "Yes" } else { "No" }.into(),
            security: if i % 3 == 0 { "No" } else { "Yes" }.into(),
            amenities: "Playground".into(),
            facing: "East".into(),
            owner: "Builder".into(),
            availability: if i % 4 == 0 {
                "Under_Construction"
            } else {
                "Ready_to_Move"
            }
            .into(),
        });
    }
    rows
}
