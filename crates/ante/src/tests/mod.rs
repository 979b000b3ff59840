mod eth_lane_test;
