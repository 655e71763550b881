mod harness;

mod crm_flow_tests;
mod quota_flow_tests;
mod upload_tests;
