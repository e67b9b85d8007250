mod central_header;
mod codec;
mod end_record;
mod entry;
mod format;
mod index;
mod local_header;
mod reader;
mod writer;
mod zip_archive;

pub use central_header::CentralFileHeader;
pub use codec::{compress_entry, expand_entry, PayloadSummary};
pub use end_record::EndOfCentralDirectory;
pub use entry::EntryInfo;
pub use format::{
    CompressionMethod, DosDateTime, CENTRAL_HEADER_SIGNATURE, CENTRAL_HEADER_SIZE,
    END_RECORD_SIGNATURE, END_RECORD_SIZE, LOCAL_HEADER_SIGNATURE, LOCAL_HEADER_SIZE,
    MAX_COMMENT_SIZE, ZIP_VERSION,
};
pub use local_header::LocalFileHeader;
pub use reader::{ExtractOptions, ExtractTarget, ExtractedFile};
pub use zip_archive::ZipArchive;
