use std::fmt;
use std::io;
use std::str::FromStr;

use csv::WriterBuilder;
use log::debug;
use serde::Serialize;

use crate::error::Result;
use crate::mode_s;
use crate::registry::{codes, DeregRecord, MasterRecord, ModelReference, Tables};

/// `TYPE AIRCRAFT` / `TYPE-ACFT` code for rotorcraft
pub const ROTORCRAFT: &str = "6";
/// `TYPE ENGINE` / `TYPE-ENG` code for electric engines
pub const ELECTRIC: &str = "10";
/// `AC-WEIGHT` class of unmanned aircraft up to 55 lbs
pub const UAV_WEIGHT_CLASS: &str = "CLASS 4";

/// Decides which registrations count as drones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DronePolicy {
    /// Electric rotorcraft, judged by aircraft and engine type.
    TypeAndEngine,
    /// Anything whose model is in the UAV weight class.
    WeightClass,
    /// Either of the above.
    Either,
}

impl Default for DronePolicy {
    fn default() -> Self {
        DronePolicy::TypeAndEngine
    }
}

impl DronePolicy {
    pub fn is_drone_model(self, model: &ModelReference) -> bool {
        let by_type = is_electric_rotorcraft(&model.type_aircraft, &model.type_engine);
        let by_weight = model.ac_weight == UAV_WEIGHT_CLASS;

        match self {
            DronePolicy::TypeAndEngine => by_type,
            DronePolicy::WeightClass => by_weight,
            DronePolicy::Either => by_type || by_weight,
        }
    }

    /// Pre-filters active registrations before the model lookup. Only the
    /// master table carries aircraft and engine types.
    pub fn is_candidate(self, record: &MasterRecord) -> bool {
        match self {
            DronePolicy::TypeAndEngine => is_electric_rotorcraft(&record.type_aircraft, &record.type_engine),
            DronePolicy::WeightClass | DronePolicy::Either => true,
        }
    }
}

fn is_electric_rotorcraft(type_aircraft: &str, type_engine: &str) -> bool {
    type_aircraft == ROTORCRAFT && type_engine == ELECTRIC
}

impl FromStr for DronePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "type-engine" => Ok(DronePolicy::TypeAndEngine),
            "weight-class" => Ok(DronePolicy::WeightClass),
            "either" => Ok(DronePolicy::Either),
            _ => Err(format!("unknown drone classification: {}", s)),
        }
    }
}

impl fmt::Display for DronePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DronePolicy::TypeAndEngine => "type-engine",
            DronePolicy::WeightClass => "weight-class",
            DronePolicy::Either => "either",
        })
    }
}

/// How the copied fields end up in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatting {
    /// Fields are copied as they appear in the tables.
    Verbatim,
    /// Codes are replaced by their descriptions, dates and ZIP codes are
    /// reformatted.
    Decoded,
}

impl Formatting {
    fn registrant_type(self, code: &str) -> String {
        self.decode(code, |code| codes::registrant_type(code).map(str::to_owned))
    }

    fn status(self, code: &str) -> String {
        self.decode(code, |code| codes::status(code).map(str::to_owned))
    }

    fn date(self, text: &str) -> String {
        self.decode(text, codes::format_date)
    }

    fn zip(self, text: &str) -> String {
        self.decode(text, |text| Some(codes::format_zip(text)))
    }

    fn decode<F: FnOnce(&str) -> Option<String>>(self, text: &str, f: F) -> String {
        match self {
            Formatting::Verbatim => text.to_owned(),
            Formatting::Decoded => f(text).unwrap_or_else(|| text.to_owned()),
        }
    }
}

/// One line of the drone extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroneRow {
    pub n_number: String,
    pub serial_number: String,
    pub mode_s_code: String,
    pub mode_s_code_hex: String,
    pub mfr_mdl_code: String,
    pub mfr: String,
    pub model: String,
    pub no_eng: String,
    pub ac_weight: String,
    pub type_registrant: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub status: String,
    pub cert_issue_date: String,
    pub airworthiness_date: String,
    pub last_action_date: String,
    /// Empty for active registrations.
    pub cancel_date: String,
}

impl DroneRow {
    pub const HEADERS: [&'static str; 18] = [
        "n_number",
        "serial_number",
        "mode_s_code",
        "mode_s_code_hex",
        "mfr_mdl_code",
        "mfr",
        "model",
        "no_eng",
        "ac_weight",
        "type_registrant",
        "city",
        "state",
        "zip_code",
        "status",
        "cert_issue_date",
        "airworthiness_date",
        "last_action_date",
        "cancel_date",
    ];

    pub fn active(record: &MasterRecord, model: &ModelReference, formatting: Formatting) -> DroneRow {
        DroneRow {
            n_number: record.n_number.clone(),
            serial_number: record.serial_number.clone(),
            mode_s_code: record.mode_s_code.clone(),
            mode_s_code_hex: derive_hex(&record.mode_s_code, &record.mode_s_code_hex),
            mfr_mdl_code: record.mfr_mdl_code.clone(),
            mfr: model.mfr.clone(),
            model: model.model.clone(),
            no_eng: model.no_eng.clone(),
            ac_weight: model.ac_weight.clone(),
            type_registrant: formatting.registrant_type(&record.type_registrant),
            city: record.city.clone(),
            state: record.state.clone(),
            zip_code: formatting.zip(&record.zip_code),
            status: formatting.status(&record.status),
            cert_issue_date: formatting.date(&record.cert_issue_date),
            airworthiness_date: formatting.date(&record.airworthiness_date),
            last_action_date: formatting.date(&record.last_action_date),
            cancel_date: String::new(),
        }
    }

    pub fn deregistered(record: &DeregRecord, model: &ModelReference, formatting: Formatting) -> DroneRow {
        DroneRow {
            n_number: record.n_number.clone(),
            serial_number: record.serial_number.clone(),
            mode_s_code: record.mode_s_code.clone(),
            mode_s_code_hex: derive_hex(&record.mode_s_code, &record.mode_s_code_hex),
            mfr_mdl_code: record.mfr_mdl_code.clone(),
            mfr: model.mfr.clone(),
            model: model.model.clone(),
            no_eng: model.no_eng.clone(),
            ac_weight: model.ac_weight.clone(),
            type_registrant: formatting.registrant_type(&record.type_registrant),
            city: record.city.clone(),
            state: record.state.clone(),
            zip_code: formatting.zip(&record.zip_code),
            status: formatting.status(&record.status),
            cert_issue_date: formatting.date(&record.cert_issue_date),
            airworthiness_date: formatting.date(&record.airworthiness_date),
            last_action_date: formatting.date(&record.last_action_date),
            cancel_date: formatting.date(&record.cancel_date),
        }
    }
}

/// Derives the hex code from the octal one, falling back to the hex code the
/// table publishes if the octal code is missing or broken.
fn derive_hex(mode_s_code: &str, published_hex: &str) -> String {
    mode_s::octal_to_hex(mode_s_code).unwrap_or_else(|| published_hex.to_owned())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinReport {
    pub active: usize,
    pub deregistered: usize,
    /// Drone candidates whose `mfr_mdl_code` has no drone model entry.
    pub unresolved: usize,
}

/// Joins the drone registrations of both tables with their models.
///
/// Active registrations come first, followed by the deregistered ones, each
/// ordered by N-number.
pub fn join(tables: &Tables, policy: DronePolicy, formatting: Formatting) -> (Vec<DroneRow>, JoinReport) {
    let mut report = JoinReport::default();
    let mut rows = Vec::new();

    let drone_model = |code: &str| tables.models.get(code).filter(|model| policy.is_drone_model(model));

    for record in tables.master.iter() {
        if !policy.is_candidate(record) {
            continue;
        }

        match drone_model(&record.mfr_mdl_code) {
            Some(model) => {
                rows.push(DroneRow::active(record, model, formatting));
                report.active += 1;
            }
            None => report.unresolved += 1,
        }
    }

    for record in tables.dereg.iter() {
        match drone_model(&record.mfr_mdl_code) {
            Some(model) => {
                rows.push(DroneRow::deregistered(record, model, formatting));
                report.deregistered += 1;
            }
            None => report.unresolved += 1,
        }
    }

    debug!("Join result: {:?}", report);

    (rows, report)
}

/// Writes the header row followed by all rows.
pub fn write_csv<W: io::Write>(rows: &[DroneRow], writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    writer.write_record(&DroneRow::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Table;

    const MASTER: &str = "N-NUMBER,SERIAL NUMBER,MFR MDL CODE,TYPE REGISTRANT,CITY,STATE,ZIP CODE,LAST ACTION DATE,CERT ISSUE DATE,TYPE AIRCRAFT,TYPE ENGINE,STATUS CODE,MODE S CODE,AIR WORTH DATE,MODE S CODE HEX,
100DR,SN100,DRONE01,1,WICHITA,KS,672021234,20210312,20190405,6,10,V,51106413,20190405,A48D0B,
200DR,SN200,DRONE02,7,AUSTIN,TX,78701,20220101,20210601,6,10,V,,20210601,,
300FW,SN300,CESSNA1,1,DENVER,CO,80202,20200101,20150101,4,1,V,52000000,20150101,A80000,
400XX,SN400,UNKNOWN,3,BOSTON,MA,02108,20220101,20210101,6,10,V,,20210101,,
500HV,SN500,HEAVY01,3,RENO,NV,89501,20220101,20210101,6,10,V,,20210101,,
";

    const ACFTREF: &str = "CODE,MFR,MODEL,TYPE-ACFT,TYPE-ENG,NO-ENG,AC-WEIGHT,
DRONE01,DJI,MAVIC 2 PRO,6,10,04,CLASS 4,
DRONE02,SKYDIO,X2,6,10,04,CLASS 4,
CESSNA1,CESSNA,172S,4,1,01,CLASS 1,
HEAVY01,ACME,LIFTER,6,10,08,CLASS 1,
";

    const DEREG: &str = "N-NUMBER,SERIAL-NUMBER,MFR-MDL-CODE,STATUS-CODE,CITY-MAIL,STATE-ABBREV-MAIL,ZIP-CODE-MAIL,AIR-WORTH-DATE,CANCEL-DATE,MODE-S-CODE,INDICATOR-GROUP,LAST-ACT-DATE,CERT-ISSUE-DATE,MODE S CODE HEX,
100DR,SN099,DRONE01,D,TULSA,OK,741031234,20180101,20190301,,1,20190301,20180101,,
600CN,SN600,CESSNA1,D,OMAHA,NE,68102,20100101,20200101,,1,20200101,20100101,,
";

    fn tables() -> Tables {
        Tables {
            master: Table::from_reader(MASTER.as_bytes()).unwrap(),
            models: Table::from_reader(ACFTREF.as_bytes()).unwrap(),
            dereg: Table::from_reader(DEREG.as_bytes()).unwrap(),
        }
    }

    fn n_numbers(rows: &[DroneRow]) -> Vec<&str> {
        rows.iter().map(|row| row.n_number.as_str()).collect()
    }

    #[test]
    fn test_join_type_and_engine() {
        let (rows, report) = join(&tables(), DronePolicy::TypeAndEngine, Formatting::Verbatim);

        assert_eq!(n_numbers(&rows), vec!["100DR", "200DR", "500HV", "100DR"]);
        assert_eq!(report, JoinReport { active: 3, deregistered: 1, unresolved: 2 });

        assert_eq!(rows[0].cancel_date, "");
        assert_eq!(rows[3].cancel_date, "20190301");
    }

    #[test]
    fn test_join_weight_class() {
        let (rows, report) = join(&tables(), DronePolicy::WeightClass, Formatting::Verbatim);

        assert_eq!(n_numbers(&rows), vec!["100DR", "200DR", "100DR"]);
        assert_eq!(report.active, 2);
        assert_eq!(report.deregistered, 1);
    }

    #[test]
    fn test_join_either() {
        let (rows, _) = join(&tables(), DronePolicy::Either, Formatting::Verbatim);
        assert_eq!(n_numbers(&rows), vec!["100DR", "200DR", "500HV", "100DR"]);
    }

    #[test]
    fn test_verbatim_fields() {
        let (rows, _) = join(&tables(), DronePolicy::TypeAndEngine, Formatting::Verbatim);

        assert_eq!(
            rows[0],
            DroneRow {
                n_number: "100DR".into(),
                serial_number: "SN100".into(),
                mode_s_code: "51106413".into(),
                mode_s_code_hex: "A48D0B".into(),
                mfr_mdl_code: "DRONE01".into(),
                mfr: "DJI".into(),
                model: "MAVIC 2 PRO".into(),
                no_eng: "04".into(),
                ac_weight: "CLASS 4".into(),
                type_registrant: "1".into(),
                city: "WICHITA".into(),
                state: "KS".into(),
                zip_code: "672021234".into(),
                status: "V".into(),
                cert_issue_date: "20190405".into(),
                airworthiness_date: "20190405".into(),
                last_action_date: "20210312".into(),
                cancel_date: "".into(),
            }
        );
    }

    #[test]
    fn test_decoded_fields() {
        let (rows, _) = join(&tables(), DronePolicy::TypeAndEngine, Formatting::Decoded);

        let row = &rows[0];
        assert_eq!(row.type_registrant, "Individual");
        assert_eq!(row.status, "Valid");
        assert_eq!(row.zip_code, "67202-1234");
        assert_eq!(row.cert_issue_date, "2019-04-05");
        assert_eq!(row.last_action_date, "2021-03-12");

        let dereg = &rows[3];
        assert_eq!(dereg.status, "Expired Dealer");
        assert_eq!(dereg.cancel_date, "2019-03-01");
        assert_eq!(dereg.zip_code, "74103-1234");
    }

    #[test]
    fn test_join_keeps_every_deregistration() {
        let dereg = "N-NUMBER,SERIAL-NUMBER,MFR-MDL-CODE,STATUS-CODE,CITY-MAIL,STATE-ABBREV-MAIL,ZIP-CODE-MAIL,AIR-WORTH-DATE,CANCEL-DATE,MODE-S-CODE,INDICATOR-GROUP,LAST-ACT-DATE,CERT-ISSUE-DATE,
100DR,SN-A,DRONE01,D,TULSA,OK,74103,20170101,20180301,,1,20180301,20170101,
100DR,SN-B,DRONE02,D,TULSA,OK,74103,20180401,20190301,,1,20190301,20180401,
";
        let mut tables = tables();
        tables.dereg = Table::from_reader(dereg.as_bytes()).unwrap();
        assert_eq!(tables.dereg.report().duplicates, 0);

        let (rows, report) = join(&tables, DronePolicy::TypeAndEngine, Formatting::Verbatim);
        assert_eq!(report.deregistered, 2);

        let serials: Vec<_> = rows[report.active..].iter().map(|row| row.serial_number.as_str()).collect();
        assert_eq!(serials, vec!["SN-A", "SN-B"]);
    }

    #[test]
    fn test_hex_falls_back_to_published_value() {
        assert_eq!(derive_hex("51106413", "000000"), "A48D0B");
        assert_eq!(derive_hex("", "A48D0B"), "A48D0B");
        assert_eq!(derive_hex("9999", "ABC123"), "ABC123");
        assert_eq!(derive_hex("", ""), "");
    }

    #[test]
    fn test_hex_matches_mode_s_code() {
        let (rows, _) = join(&tables(), DronePolicy::Either, Formatting::Verbatim);

        for row in rows.iter().filter(|row| !row.mode_s_code.is_empty()) {
            let address = mode_s::parse_hex(&row.mode_s_code_hex).unwrap();
            assert_eq!(mode_s::parse_octal(&row.mode_s_code), Some(address));
        }
    }

    #[test]
    fn test_write_csv() {
        let (rows, _) = join(&tables(), DronePolicy::WeightClass, Formatting::Verbatim);

        let mut buffer = Vec::new();
        write_csv(&rows, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "n_number,serial_number,mode_s_code,mode_s_code_hex,mfr_mdl_code,mfr,model,no_eng,ac_weight,\
             type_registrant,city,state,zip_code,status,cert_issue_date,airworthiness_date,last_action_date,cancel_date"
        );
        assert_eq!(
            lines[1],
            "100DR,SN100,51106413,A48D0B,DRONE01,DJI,MAVIC 2 PRO,04,CLASS 4,1,WICHITA,KS,672021234,V,20190405,20190405,20210312,"
        );
        assert_eq!(
            lines[3],
            "100DR,SN099,,,DRONE01,DJI,MAVIC 2 PRO,04,CLASS 4,1,TULSA,OK,741031234,D,20180101,20180101,20190301,20190301"
        );
    }

    #[test]
    fn test_write_csv_without_rows() {
        let mut buffer = Vec::new();
        write_csv(&[], &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("type-engine".parse::<DronePolicy>(), Ok(DronePolicy::TypeAndEngine));
        assert_eq!("weight-class".parse::<DronePolicy>(), Ok(DronePolicy::WeightClass));
        assert_eq!("either".parse::<DronePolicy>(), Ok(DronePolicy::Either));
        assert!("drones".parse::<DronePolicy>().is_err());
        assert_eq!(DronePolicy::WeightClass.to_string(), "weight-class");
    }
}
