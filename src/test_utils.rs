//! Fabricated registration database for tests.

use std::fs::File;
use std::io::{self, Cursor, Seek, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::archive::{Fetcher, ARCHIVE_NAME};
use crate::error::{Error, Result};

/// Two electric rotorcraft and one fixed wing aircraft.
pub const MASTER: &str = "\u{feff}N-NUMBER,SERIAL NUMBER,MFR MDL CODE,ENG MFR MDL,YEAR MFR,TYPE REGISTRANT,NAME,STREET,STREET2,CITY,STATE,ZIP CODE,REGION,COUNTY,COUNTRY,LAST ACTION DATE,CERT ISSUE DATE,CERTIFICATION,TYPE AIRCRAFT,TYPE ENGINE,STATUS CODE,MODE S CODE,FRACT OWNER,AIR WORTH DATE,OTHER NAMES(1),EXPIRATION DATE,UNIQUE ID,KIT MFR, KIT MODEL,MODE S CODE HEX,
101DR,1581F4XFC22XX001,05617AA,00000,2022,1,DOE JOHN,100 MAIN ST,,WICHITA,KS,672021234,3,173,US,20230315,20220601,1N,6,10,V,51106413,,20220601,,20290630,01234567,,,A48D0B,
202DR,SKX2-000202,05618BB,00000,2021,7,ACME SURVEY LLC,2 ELM ST,,TULSA,OK,74103,2,143,US,20220110,20210805,1N,6,10,V,,,20210805,,20280831,01234568,,,,
303FW,17281234,2072704,41514,2004,3,SKY SCHOOL INC,3 AIRPORT RD,,DENVER,CO,802021000,M,031,US,20200101,20040501,1N,4,1,V,52000000,,20040420,,20270531,00456789,,,A80000,
";

/// The two drone models.
pub const ACFTREF: &str = "\u{feff}CODE,MFR,MODEL,TYPE-ACFT,TYPE-ENG,AC-CAT,BUILD-CERT-IND,NO-ENG,NO-SEATS,AC-WEIGHT,SPEED,TC-DATA-SHEET,TC-DATA-HOLDER,
05617AA,DJI                           ,MAVIC 3                       ,6,10,1,0,04,000,CLASS 4,0000,                ,                                        ,
05618BB,SKYDIO INC                    ,X2                            ,6,10,1,0,04,000,CLASS 4,0000,                ,                                        ,
";

/// An earlier registration of `101DR`.
pub const DEREG: &str = "\u{feff}N-NUMBER,SERIAL-NUMBER,MFR-MDL-CODE,STATUS-CODE,NAME,STREET-MAIL,STREET2-MAIL,CITY-MAIL,STATE-ABBREV-MAIL,ZIP-CODE-MAIL,ENG-MFR-MDL,YEAR-MFR,CERTIFICATION,REGION,COUNTY-MAIL,COUNTRY-MAIL,AIR-WORTH-DATE,CANCEL-DATE,MODE-S-CODE,INDICATOR-GROUP,EXP-COUNTRY,LAST-ACT-DATE,CERT-ISSUE-DATE,KIT MFR, KIT MODEL,MODE S CODE HEX,
101DR,1581F4XFC19XX777,05617AA,D,ROE JANE,9 OAK AVE,,AUSTIN,TX,787011234,00000,2019,1N,2,453,US,20190301,20211130,51106413,1,,20211130,20190301,,,A48D0B,
";

pub fn write_zip<W: Write + Seek>(writer: W, entries: &[(&str, &str)]) -> W {
    let mut zip = ZipWriter::new(writer);
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap()
}

pub fn write_archive(path: &Path, entries: &[(&str, &str)]) {
    write_zip(File::create(path).unwrap(), entries);
}

fn fixture_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ardata.pdf", "%PDF-1.4"),
        ("MASTER.txt", MASTER),
        ("ACFTREF.txt", ACFTREF),
        ("DEREG.txt", DEREG),
    ]
}

/// Writes the fixture database as `ReleasableAircraft.zip` into `dir`.
pub fn write_fixture_archive(dir: &Path) -> PathBuf {
    let path = dir.join(ARCHIVE_NAME);
    write_archive(&path, &fixture_entries());
    path
}

pub fn fixture_archive_bytes() -> Vec<u8> {
    write_zip(Cursor::new(Vec::new()), &fixture_entries()).into_inner()
}

/// Serves a fixed response body.
pub struct StaticFetcher(pub Vec<u8>);

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str, writer: &mut dyn Write) -> Result<u64> {
        io::copy(&mut self.0.as_slice(), writer).map_err(|error| Error::Network {
            url: url.to_owned(),
            reason: error.to_string(),
        })
    }
}

/// Fails like an unreachable server.
pub struct FailingFetcher;

impl Fetcher for FailingFetcher {
    fn fetch(&self, url: &str, _writer: &mut dyn Write) -> Result<u64> {
        Err(Error::Network {
            url: url.to_owned(),
            reason: "HTTP 503 Service Unavailable".to_owned(),
        })
    }
}
