mod public_routes;
