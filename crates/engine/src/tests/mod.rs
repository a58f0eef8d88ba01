mod helpers;
mod compaction_tests;
mod recovery_tests;
