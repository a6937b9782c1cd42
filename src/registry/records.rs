use super::loader::{Record, Row};

/// An active registration from `MASTER.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterRecord {
    pub n_number: String,
    pub serial_number: String,
    pub mode_s_code: String,
    /// The hex code as published, only used when `mode_s_code` is unusable.
    pub mode_s_code_hex: String,
    pub mfr_mdl_code: String,
    pub type_registrant: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub status: String,
    pub cert_issue_date: String,
    pub airworthiness_date: String,
    pub last_action_date: String,
    pub type_aircraft: String,
    pub type_engine: String,
}

impl Record for MasterRecord {
    const FILE_NAME: &'static str = "MASTER.txt";
    const COLUMNS: &'static [&'static str] = &[
        "n_number",
        "serial_number",
        "mfr_mdl_code",
        "type_registrant",
        "city",
        "state",
        "zip_code",
        "last_action_date",
        "cert_issue_date",
        "type_aircraft",
        "type_engine",
        "status_code",
        "mode_s_code",
        "air_worth_date",
    ];

    fn from_row(row: &Row<'_>) -> Option<Self> {
        let n_number = row.get("n_number");
        if n_number.is_empty() {
            return None;
        }

        Some(MasterRecord {
            n_number: n_number.to_owned(),
            serial_number: row.string("serial_number"),
            mode_s_code: row.string("mode_s_code"),
            mode_s_code_hex: row.string("mode_s_code_hex"),
            mfr_mdl_code: row.string("mfr_mdl_code"),
            type_registrant: row.string("type_registrant"),
            city: row.string("city"),
            state: row.string("state"),
            zip_code: row.string("zip_code"),
            status: row.string("status_code"),
            cert_issue_date: row.string("cert_issue_date"),
            airworthiness_date: row.string("air_worth_date"),
            last_action_date: row.string("last_action_date"),
            type_aircraft: row.string("type_aircraft"),
            type_engine: row.string("type_engine"),
        })
    }

    fn key(&self) -> &str {
        &self.n_number
    }
}

/// A deregistered aircraft from `DEREG.txt`.
///
/// The deregistration table names most columns differently from the master
/// table (`city_mail`, `last_act_date`, `indicator_group`, ...) and carries no
/// aircraft or engine type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeregRecord {
    pub n_number: String,
    pub serial_number: String,
    pub mode_s_code: String,
    pub mode_s_code_hex: String,
    pub mfr_mdl_code: String,
    pub type_registrant: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub status: String,
    pub cert_issue_date: String,
    pub airworthiness_date: String,
    pub last_action_date: String,
    pub cancel_date: String,
}

impl Record for DeregRecord {
    const FILE_NAME: &'static str = "DEREG.txt";
    const REPEATED_KEYS: bool = true;
    const COLUMNS: &'static [&'static str] = &[
        "n_number",
        "serial_number",
        "mfr_mdl_code",
        "status_code",
        "city_mail",
        "state_abbrev_mail",
        "zip_code_mail",
        "air_worth_date",
        "cancel_date",
        "mode_s_code",
        "indicator_group",
        "last_act_date",
        "cert_issue_date",
    ];

    fn from_row(row: &Row<'_>) -> Option<Self> {
        let n_number = row.get("n_number");
        let cancel_date = row.get("cancel_date");
        if n_number.is_empty() || cancel_date.is_empty() {
            return None;
        }

        Some(DeregRecord {
            n_number: n_number.to_owned(),
            serial_number: row.string("serial_number"),
            mode_s_code: row.string("mode_s_code"),
            mode_s_code_hex: row.string("mode_s_code_hex"),
            mfr_mdl_code: row.string("mfr_mdl_code"),
            type_registrant: row.string("indicator_group"),
            city: row.string("city_mail"),
            state: row.string("state_abbrev_mail"),
            zip_code: row.string("zip_code_mail"),
            status: row.string("status_code"),
            cert_issue_date: row.string("cert_issue_date"),
            airworthiness_date: row.string("air_worth_date"),
            last_action_date: row.string("last_act_date"),
            cancel_date: cancel_date.to_owned(),
        })
    }

    fn key(&self) -> &str {
        &self.n_number
    }
}

/// A manufacturer/model entry from `ACFTREF.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReference {
    pub mfr_mdl_code: String,
    pub mfr: String,
    pub model: String,
    pub type_aircraft: String,
    pub type_engine: String,
    pub no_eng: String,
    pub ac_weight: String,
}

impl Record for ModelReference {
    const FILE_NAME: &'static str = "ACFTREF.txt";
    const COLUMNS: &'static [&'static str] = &[
        "code",
        "mfr",
        "model",
        "type_acft",
        "type_eng",
        "no_eng",
        "ac_weight",
    ];

    fn from_row(row: &Row<'_>) -> Option<Self> {
        let code = row.get("code");
        if code.is_empty() {
            return None;
        }

        Some(ModelReference {
            mfr_mdl_code: code.to_owned(),
            mfr: row.string("mfr"),
            model: row.string("model"),
            type_aircraft: row.string("type_acft"),
            type_engine: row.string("type_eng"),
            no_eng: row.string("no_eng"),
            ac_weight: row.string("ac_weight"),
        })
    }

    fn key(&self) -> &str {
        &self.mfr_mdl_code
    }
}
