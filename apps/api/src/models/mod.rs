pub mod analysis_record;
