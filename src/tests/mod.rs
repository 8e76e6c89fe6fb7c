mod profile_lookup_service_tests;
