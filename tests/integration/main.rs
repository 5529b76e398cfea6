mod api_tests;
mod borrowing_tests;
mod router_tests;
